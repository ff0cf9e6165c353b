//! Common functionality shared by the ingestion crates.
#![warn(missing_docs)]

mod macros;
mod time;

pub use crate::time::*;
