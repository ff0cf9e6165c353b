use std::fmt;

use bytes::Bytes;

/// A single name/value pair identifying a dimension of a series.
///
/// Both name and value are raw bytes. Tags are immutable once created.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    name: Bytes,
    value: Bytes,
}

impl Tag {
    /// Creates a new tag.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the tag name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the tag value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Splits the tag into name and value.
    pub fn into_parts(self) -> (Bytes, Bytes) {
        (self.name, self.value)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("name", &String::from_utf8_lossy(&self.name))
            .field("value", &String::from_utf8_lossy(&self.value))
            .finish()
    }
}

/// An ordered set of [`Tag`]s.
///
/// The order is meaningful and preserved exactly as the tags were added. Names are not
/// deduplicated.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates an empty tag set with room for `capacity` tags.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Appends a tag at the end.
    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    /// Returns the value of the first tag with the given name.
    pub fn get(&self, name: &[u8]) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|tag| tag.name() == name)
            .map(Tag::value)
    }

    /// Returns the number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the tags in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }
}

impl fmt::Debug for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.0).finish()
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_first_match() {
        let tags: Tags = vec![
            Tag::new("host", "a"),
            Tag::new("dc", "east"),
            Tag::new("host", "b"),
        ]
        .into();

        assert_eq!(tags.get(b"host"), Some(&b"a"[..]));
        assert_eq!(tags.get(b"dc"), Some(&b"east"[..]));
        assert_eq!(tags.get(b"rack"), None);
    }

    #[test]
    fn test_order_is_preserved() {
        let mut tags = Tags::with_capacity(2);
        tags.push(Tag::new("z", "1"));
        tags.push(Tag::new("a", "2"));

        let names: Vec<_> = tags.iter().map(Tag::name).collect();
        assert_eq!(names, [&b"z"[..], &b"a"[..]]);
    }

    #[test]
    fn test_debug_renders_text() {
        let tags: Tags = vec![Tag::new("host", "a")].into();
        insta::assert_debug_snapshot!(tags, @r###"
        [
            Tag {
                name: "host",
                value: "a",
            },
        ]
        "###);
    }
}
