//! Windowed aggregates over a user's intervals.
//!
//! Every function here is pure: callers pass a snapshot of the intervals, the
//! query [`Window`], and the `now` used to extend open intervals. Each
//! interval is clipped to the window before it is measured; one that falls
//! wholly outside contributes nothing.

use serde::{Deserialize, Serialize};

use crate::{
  interval::Interval,
  report::MetricKind,
  time::{Timestamp, Window},
};

/// The part of an interval that overlaps a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
  pub start: Timestamp,
  pub end:   Timestamp,
}

impl Span {
  /// Length in whole seconds. A reversed span measures zero.
  pub fn seconds(&self) -> i64 { self.start.seconds_until(self.end).max(0) }
}

/// Clip `interval` to `window`, treating an open end as `now`.
///
/// Returns `None` if the interval ends before the window opens or starts
/// after it closes.
pub fn clip(interval: &Interval, window: &Window, now: Timestamp) -> Option<Span> {
  let end = interval.end_or(now).min(window.to);
  if end < window.from || interval.start > window.to {
    return None;
  }
  Some(Span {
    start: interval.start.max(window.from),
    end,
  })
}

fn spans<'a>(
  intervals: &'a [Interval],
  window: &'a Window,
  now: Timestamp,
) -> impl Iterator<Item = Span> + 'a {
  intervals.iter().filter_map(move |i| clip(i, window, now))
}

/// Sum of clipped durations, in seconds.
pub fn total(intervals: &[Interval], window: &Window, now: Timestamp) -> i64 {
  spans(intervals, window, now).map(|s| s.seconds()).sum()
}

/// Shortest clipped duration, or `None` if no interval overlaps the window.
pub fn min(intervals: &[Interval], window: &Window, now: Timestamp) -> Option<i64> {
  spans(intervals, window, now).map(|s| s.seconds()).min()
}

/// Longest clipped duration; 0 if no interval overlaps the window.
pub fn max(intervals: &[Interval], window: &Window, now: Timestamp) -> i64 {
  spans(intervals, window, now)
    .map(|s| s.seconds())
    .max()
    .unwrap_or(0)
}

/// What an average is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
  /// Mean per overlapping interval (not per calendar day).
  #[default]
  Daily,
  /// Total divided by the number of weeks spanned, counting a partial week.
  Weekly,
  /// The plain total.
  Total,
}

impl Granularity {
  /// The metric this granularity reports as.
  pub fn metric(&self) -> MetricKind {
    match self {
      Self::Daily => MetricKind::DailyAverage,
      Self::Weekly => MetricKind::WeeklyAverage,
      Self::Total => MetricKind::Total,
    }
  }
}

/// Average online time at the given granularity; 0 if nothing overlaps.
///
/// `Weekly` divides by `days / 7 + 1`, where `days` runs from the first
/// overlapping span's start to the last one's end.
pub fn average(
  intervals: &[Interval],
  window: &Window,
  now: Timestamp,
  granularity: Granularity,
) -> i64 {
  let clipped: Vec<Span> = spans(intervals, window, now).collect();
  let (Some(first), Some(last)) = (clipped.first(), clipped.last()) else {
    return 0;
  };
  let total: i64 = clipped.iter().map(Span::seconds).sum();

  match granularity {
    Granularity::Daily => total / clipped.len() as i64,
    Granularity::Weekly => {
      let days = first.start.days_until(last.end).max(0);
      total / (days / 7 + 1)
    }
    Granularity::Total => total,
  }
}

/// Evaluate a single report metric. `None` for `Min` without data and for
/// `Unknown`.
pub fn evaluate(
  kind: MetricKind,
  intervals: &[Interval],
  window: &Window,
  now: Timestamp,
) -> Option<i64> {
  match kind {
    MetricKind::Total => Some(total(intervals, window, now)),
    MetricKind::DailyAverage => {
      Some(average(intervals, window, now, Granularity::Daily))
    }
    MetricKind::WeeklyAverage => {
      Some(average(intervals, window, now, Granularity::Weekly))
    }
    MetricKind::Min => min(intervals, window, now),
    MetricKind::Max => Some(max(intervals, window, now)),
    MetricKind::Unknown => None,
  }
}
