#![forbid(unsafe_code)]

//! Domain model for the vocabulary quiz: words, sessions, snapshots and reports.
//!
//! Nothing in this crate performs I/O. Storage adapters live in `storage`,
//! orchestration in `services`.

pub mod error;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
