//! Ingestion of carbon metrics.
//!
//! Carbon metrics arrive as a dot separated name, a timestamp and a value. The
//! [`CarbonIngester`] converts the name into positional tags and routes the metric into the
//! [`DownsamplerAndWriter`](ingest_writer::DownsamplerAndWriter) according to a list of
//! [`Rules`]. Each rule decides whether the metric is aggregated by the downsampler or written
//! directly into the namespaces of its storage policies.
//!
//! ```
//! use ingest_carbon::{CarbonIngesterConfig, Rules};
//!
//! let config: CarbonIngesterConfig = serde_yaml::from_str(
//!     r#"
//! rules:
//!   - pattern: "^stats\\."
//!     aggregation:
//!       type: sum
//!     policies: ["1m:40d"]
//! "#,
//! )
//! .unwrap();
//!
//! let rules = Rules::compile(&config).unwrap();
//! assert_eq!(rules.matching(b"stats.requests").count(), 1);
//! ```
#![warn(missing_docs)]

mod config;
mod ingester;
mod rules;
mod statsd;

pub use self::config::*;
pub use self::ingester::*;
pub use self::rules::*;
