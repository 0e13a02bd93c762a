//! Named multi-metric reports.
//!
//! A [`ReportConfig`] lists metrics and users; [`build`] evaluates every
//! `(user, metric)` pair over one window and adds a cross-user rollup.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{
  interval::{Interval, UserId},
  metrics,
  time::{Timestamp, Window},
};

/// Message embedded in report entries for forgotten users.
pub const FORGOTTEN_MESSAGE: &str =
  "User ID is in the blacklist and has been forgotten.";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
  Total,
  DailyAverage,
  WeeklyAverage,
  Min,
  Max,
  /// Any other name. Kept in the stored config, skipped when generating.
  #[serde(other)]
  Unknown,
}

impl MetricKind {
  /// The JSON key this metric is reported under.
  pub fn key(&self) -> &'static str {
    match self {
      Self::Total => "total",
      Self::DailyAverage => "dailyAverage",
      Self::WeeklyAverage => "weeklyAverage",
      Self::Min => "min",
      Self::Max => "max",
      Self::Unknown => "unknown",
    }
  }

  pub fn is_known(&self) -> bool { *self != Self::Unknown }
}

/// A stored, reusable report definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
  #[serde(default)]
  pub metrics: Vec<MetricKind>,
  #[serde(default)]
  pub users:   Vec<UserId>,
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One cell of a report row: `{"total": 900}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEntry {
  Value {
    kind:  MetricKind,
    /// `None` only for `min` with no overlapping interval.
    value: Option<i64>,
  },
  Forgotten,
}

impl Serialize for MetricEntry {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    match self {
      Self::Value { kind, value } => map.serialize_entry(kind.key(), value)?,
      Self::Forgotten => map.serialize_entry("error", FORGOTTEN_MESSAGE)?,
    }
    map.end()
  }
}

/// All metrics for one user, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
  pub user_id: UserId,
  pub metrics: Vec<MetricEntry>,
}

/// Cross-user aggregate per configured metric, serialised as a JSON object in
/// configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rollup(pub Vec<(MetricKind, Option<i64>)>);

impl Rollup {
  pub fn get(&self, kind: MetricKind) -> Option<Option<i64>> {
    self.0.iter().find(|(k, _)| *k == kind).map(|(_, v)| *v)
  }
}

impl Serialize for Rollup {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (kind, value) in &self.0 {
      map.serialize_entry(kind.key(), value)?;
    }
    map.end()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
  pub users:  Vec<UserReport>,
  pub global: Rollup,
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Evaluate `config` over `window`.
///
/// `lookup` returns a user's intervals, or `None` if the user has been
/// forgotten. Forgotten users get error entries and are left out of the
/// rollup. Unknown metrics produce neither entries nor rollup keys.
pub fn build<'a, F>(
  config: &ReportConfig,
  window: &Window,
  now: Timestamp,
  mut lookup: F,
) -> Report
where
  F: FnMut(&str) -> Option<&'a [Interval]>,
{
  let kinds: Vec<MetricKind> = config
    .metrics
    .iter()
    .copied()
    .filter(MetricKind::is_known)
    .collect();
  let mut users = Vec::with_capacity(config.users.len());
  let mut rows: Vec<Vec<Option<i64>>> = Vec::new();

  for user_id in &config.users {
    let metrics = match lookup(user_id) {
      Some(intervals) => {
        let values: Vec<Option<i64>> = kinds
          .iter()
          .map(|&kind| metrics::evaluate(kind, intervals, window, now))
          .collect();
        let entries = kinds
          .iter()
          .zip(&values)
          .map(|(&kind, &value)| MetricEntry::Value { kind, value })
          .collect();
        rows.push(values);
        entries
      }
      None => vec![MetricEntry::Forgotten; kinds.len()],
    };
    users.push(UserReport {
      user_id: user_id.clone(),
      metrics,
    });
  }

  Report {
    users,
    global: rollup(&kinds, &rows),
  }
}

/// `rows[u][m]` is user `u`'s value for `kinds[m]`. Repeated kinds are
/// reported once.
fn rollup(kinds: &[MetricKind], rows: &[Vec<Option<i64>>]) -> Rollup {
  let mut out: Vec<(MetricKind, Option<i64>)> = Vec::with_capacity(kinds.len());

  for (column, &kind) in kinds.iter().enumerate() {
    if out.iter().any(|(k, _)| *k == kind) {
      continue;
    }
    let values = rows.iter().filter_map(|row| row[column]);
    let value = match kind {
      MetricKind::Total => Some(values.sum()),
      MetricKind::DailyAverage | MetricKind::WeeklyAverage => {
        let values: Vec<i64> = values.collect();
        if values.is_empty() {
          Some(0)
        } else {
          Some(values.iter().sum::<i64>() / values.len() as i64)
        }
      }
      MetricKind::Min => values.min(),
      MetricKind::Max => Some(values.max().unwrap_or(0)),
      MetricKind::Unknown => continue,
    };
    out.push((kind, value));
  }
  Rollup(out)
}
