//! Online intervals, the unit the store accumulates per user.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Opaque, case-sensitive user key as sent by the presence feed.
pub type UserId = String;

/// One stretch of observed online time.
///
/// `end == None` means the user is still online. A user's sequence holds at
/// most one open interval, and only in last position.
///
/// Serialised as a two-element array: `["2023-10-19T08:30", null]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  from = "(Timestamp, Option<Timestamp>)",
  into = "(Timestamp, Option<Timestamp>)"
)]
pub struct Interval {
  pub start: Timestamp,
  pub end:   Option<Timestamp>,
}

impl Interval {
  pub fn open(start: Timestamp) -> Self { Self { start, end: None } }

  pub fn closed(start: Timestamp, end: Timestamp) -> Self {
    Self {
      start,
      end: Some(end),
    }
  }

  pub fn is_open(&self) -> bool { self.end.is_none() }

  /// The end, or `now` if the interval is still open.
  pub fn end_or(&self, now: Timestamp) -> Timestamp { self.end.unwrap_or(now) }
}

impl From<(Timestamp, Option<Timestamp>)> for Interval {
  fn from((start, end): (Timestamp, Option<Timestamp>)) -> Self {
    Self { start, end }
  }
}

impl From<Interval> for (Timestamp, Option<Timestamp>) {
  fn from(i: Interval) -> Self { (i.start, i.end) }
}
