//! Core types and the in-memory presence service for `seen`.
//!
//! This crate is free of HTTP and network dependencies. The ingestor and the
//! API crates both drive a shared [`tracker::Tracker`].

pub mod error;
pub mod interval;
pub mod metrics;
pub mod report;
pub mod time;
pub mod tracker;

pub use error::{Error, Result};
pub use interval::{Interval, UserId};
pub use time::{Timestamp, Window};
pub use tracker::{Applied, Tracker};

#[cfg(test)]
mod tests;
