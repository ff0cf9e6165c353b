//! Writes ingested metrics to a downsampler and to storage.
//!
//! The [`DownsamplerAndWriter`] is the last step of the ingestion front end. Each metric is
//! handed to up to two sinks:
//!
//!  - The [`Downsampler`], which aggregates samples according to its mapping rules. Appending
//!    to the downsampler is synchronous and uses one stateful [`MetricsAppender`] at a time.
//!  - The [`Storage`], which receives the raw samples as an unaggregated write, or one
//!    aggregated write per storage policy when the caller overrides the storage policies.
//!
//! Storage writes are spawned as tokio tasks and run in parallel. A call always waits for all of
//! its tasks before it returns, and failures of individual writes are collected into a
//! [`MultiError`] instead of aborting sibling writes.
//!
//! Batches are passed in through a rewindable [`DownsampleAndWriteIter`]. The iterator is walked
//! once to launch the storage writes and a second time to feed the downsampler.
#![warn(missing_docs)]

mod downsample;
mod error;
mod iter;
mod statsd;
mod storage;
mod writer;

pub use self::downsample::*;
pub use self::error::*;
pub use self::iter::*;
pub use self::storage::*;
pub use self::writer::*;
