//! Logging facade shared by the ingestion crates.
//!
//! All crates log through the macros re-exported here ([`error!`], [`warn!`], [`info!`],
//! [`debug!`] and [`trace!`]) so that the subscriber is configured in a single place.
//!
//! # Setup
//!
//! With the `init` feature, [`init`] installs the global subscriber from a [`LogConfig`]. The
//! config deserializes from the `logging` section of the configuration file.
//!
//! ```
//! # #[cfg(feature = "init")] {
//! ingest_log::init(&ingest_log::LogConfig::default());
//! # }
//! ```
//!
//! # Levels
//!
//! Messages are lowercase without trailing punctuation. A rejected metric name or a failed
//! storage write is returned to the caller and never logged above `debug`. Reserve `error!` for
//! states that indicate a bug, such as a metrics client that cannot send.
//!
//! ```
//! ingest_log::debug!(rules = 3, "carbon rules compiled");
//! ```
//!
//! # Errors
//!
//! [`LogError`] renders an error followed by its chain of sources:
//!
//! ```
//! use ingest_log::LogError;
//!
//! let error = std::io::Error::other("connection refused");
//! ingest_log::warn!("storage unavailable: {}", LogError(&error));
//! ```
//!
//! # Tests
//!
//! Unit tests call [`init_test!`] (feature `test`) to route the calling crate's logs into the
//! test output.

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

#[cfg(feature = "test")]
mod test;
#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
