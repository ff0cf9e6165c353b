//! Data model of the metrics ingestion front end.
//!
//! Metrics enter the system as a name and one or more [`Datapoint`]s. Carbon names are dot
//! delimited (`servers.web01.cpu`) and carry no explicit tags, so they are converted into a
//! positional [`Tags`] set with [`generate_tags`]:
//!
//! ```
//! use ingest_metrics::generate_tags;
//!
//! let tags = generate_tags(b"servers.web01.cpu").unwrap();
//! assert_eq!(tags.get(b"__$1__"), Some(&b"web01"[..]));
//! ```
//!
//! Writes may be routed to specific aggregations and retentions. These are expressed with
//! [`MappingRule`]s and [`StoragePolicy`]s:
//!
//! ```
//! use ingest_metrics::{AggregationType, MappingRule, StoragePolicy};
//!
//! let rule = MappingRule {
//!     aggregations: vec![AggregationType::Mean],
//!     policies: vec!["1m:40d".parse::<StoragePolicy>().unwrap()],
//! };
//! assert_eq!(rule.policies[0].to_string(), "1m:40d");
//! ```
#![warn(missing_docs)]

mod carbon;
mod datapoint;
mod policy;
mod rules;
mod tags;

pub use self::carbon::*;
pub use self::datapoint::*;
pub use self::policy::*;
pub use self::rules::*;
pub use self::tags::*;

#[doc(inline)]
pub use ingest_common::UnixTimestamp;
