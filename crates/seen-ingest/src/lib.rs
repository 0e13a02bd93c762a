//! Polling ingestion for `seen`.
//!
//! A [`PresenceSource`] yields pages of presence samples; the [`Ingestor`]
//! folds them into a shared [`seen_core::Tracker`] on a fixed cadence until
//! its cancellation token fires.

pub mod error;
pub mod ingestor;
pub mod source;

pub use error::FetchError;
pub use ingestor::{Ingestor, PassStats};
pub use source::{HttpSource, Page, PresenceSource, Sample};
