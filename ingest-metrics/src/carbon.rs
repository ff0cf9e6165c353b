//! Conversion of carbon (graphite) metric names into positional tags.

use bytes::Bytes;

use crate::{Tag, Tags};

/// Separates the nodes of a carbon metric name.
const SEPARATOR: u8 = b'.';

/// Error returned by [`generate_tags`] for names that cannot be split into tags.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMetricName {
    /// The name has no bytes at all.
    #[error("carbon metric: cannot generate tags from empty name")]
    Empty,
    /// The name contains an empty node that is not the single trailing one.
    #[error(
        "carbon metric: {} has duplicate separator",
        String::from_utf8_lossy(.0)
    )]
    DuplicateSeparator(Vec<u8>),
}

impl MalformedMetricName {
    /// Returns the offending metric name.
    pub fn name(&self) -> &[u8] {
        match self {
            Self::Empty => b"",
            Self::DuplicateSeparator(name) => name,
        }
    }
}

/// Returns the synthetic tag name for the node at `index`, e.g. `__$0__`.
pub fn positional_tag_name(index: usize) -> Bytes {
    Bytes::from(format!("__${index}__"))
}

/// Generates positional tags from a carbon metric name.
///
/// Every node of the dot delimited name becomes a tag named after its position (see
/// [`positional_tag_name`]) with the node as value. A single trailing separator is ignored. Any
/// other empty node, including a leading one, makes the whole name malformed.
///
/// # Example
///
/// ```
/// use ingest_metrics::generate_tags;
///
/// let tags = generate_tags(b"foo.bar.baz.").unwrap();
/// assert_eq!(tags.len(), 3);
///
/// let error = generate_tags(b"foo..bar").unwrap_err();
/// assert_eq!(error.to_string(), "carbon metric: foo..bar has duplicate separator");
/// ```
pub fn generate_tags(name: &[u8]) -> Result<Tags, MalformedMetricName> {
    if name.is_empty() {
        return Err(MalformedMetricName::Empty);
    }

    let owned = Bytes::copy_from_slice(name);
    let node_count = name.iter().filter(|&&b| b == SEPARATOR).count() + 1;
    let mut tags = Tags::with_capacity(node_count);

    let mut nodes = owned.split(|&b| b == SEPARATOR).peekable();
    while let Some(node) = nodes.next() {
        if node.is_empty() {
            // Only the node after a single trailing separator may be empty.
            if nodes.peek().is_none() && !tags.is_empty() {
                break;
            }
            return Err(MalformedMetricName::DuplicateSeparator(name.to_vec()));
        }

        tags.push(Tag::new(
            positional_tag_name(tags.len()),
            owned.slice_ref(node),
        ));
    }

    Ok(tags)
}
