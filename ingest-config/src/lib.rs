//! Configuration of the metrics ingestion front end.
//!
//! The configuration is a single YAML document with a section per component:
//!
//! ```yaml
//! logging:
//!   level: debug
//!   format: json
//! metrics:
//!   statsd: "127.0.0.1:8125"
//!   prefix: ingest
//! carbon:
//!   rules:
//!     - pattern: "^servers\\."
//!       policies: ["1m:40d"]
//! ```
//!
//! Load it with [`Config::from_path`], then initialize the components from its sections.
#![warn(missing_docs)]

mod config;

pub use self::config::*;
