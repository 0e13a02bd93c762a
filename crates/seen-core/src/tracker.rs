//! [`Tracker`] — the process-wide presence service.
//!
//! Owns the interval store, the set of forgotten users, and the saved report
//! configurations. Constructed once at startup and shared as `Arc<Tracker>`
//! between the ingestor task and the HTTP handlers; nothing is persisted.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
  Error, Result,
  interval::{Interval, UserId},
  metrics::{self, Granularity},
  report::{self, MetricKind, Report, ReportConfig},
  time::{Timestamp, Window},
};

/// What a store mutation did. Returned for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  /// A new open interval was appended.
  Opened,
  /// The user already had an open interval; nothing changed.
  AlreadyOpen,
  /// The trailing open interval was given an end.
  Closed,
  /// No interval was open, so a closed one was appended.
  Backfilled,
  /// The user is forgotten; the sample was dropped.
  Dropped,
}

#[derive(Debug, Default)]
struct Presence {
  intervals: HashMap<UserId, Vec<Interval>>,
  forgotten: HashSet<UserId>,
}

impl Presence {
  /// `None` for forgotten users, the (possibly empty) sequence otherwise.
  fn lookup(&self, user: &str) -> Option<&[Interval]> {
    if self.forgotten.contains(user) {
      return None;
    }
    Some(self.intervals.get(user).map(Vec::as_slice).unwrap_or_default())
  }

  /// Drop every interval stored for `user`, returning how many there were.
  fn remove_intervals(&mut self, user: &str) -> usize {
    self.intervals.remove(user).map_or(0, |v| v.len())
  }
}

/// In-memory presence store with metric and report queries.
///
/// Interval mutations and the forgotten check happen under one write lock, so
/// a sample racing a forget can never resurrect the user.
#[derive(Debug, Default)]
pub struct Tracker {
  presence: RwLock<Presence>,
  reports:  RwLock<HashMap<String, ReportConfig>>,
}

impl Tracker {
  pub fn new() -> Self { Self::default() }

  // ── Interval store ────────────────────────────────────────────────────

  /// Open an interval at `at` unless one is already open.
  pub async fn append_open(&self, user: &str, at: Timestamp) -> Applied {
    let mut presence = self.presence.write().await;
    if presence.forgotten.contains(user) {
      return Applied::Dropped;
    }
    let intervals = presence.intervals.entry(user.to_owned()).or_default();
    if intervals.last().is_some_and(Interval::is_open) {
      return Applied::AlreadyOpen;
    }
    intervals.push(Interval::open(at));
    Applied::Opened
  }

  /// End the open interval at `at`, or append `[fallback_start, at]` if
  /// none is open.
  pub async fn close_open(
    &self,
    user: &str,
    at: Timestamp,
    fallback_start: Timestamp,
  ) -> Applied {
    let mut presence = self.presence.write().await;
    if presence.forgotten.contains(user) {
      return Applied::Dropped;
    }
    let intervals = presence.intervals.entry(user.to_owned()).or_default();
    match intervals.last_mut() {
      Some(last) if last.is_open() => {
        last.end = Some(at);
        Applied::Closed
      }
      _ => {
        intervals.push(Interval::closed(fallback_start, at));
        Applied::Backfilled
      }
    }
  }

  /// Drop every interval stored for `user`. Returns how many were removed.
  pub async fn purge(&self, user: &str) -> usize {
    self.presence.write().await.remove_intervals(user)
  }

  // ── Retention ─────────────────────────────────────────────────────────

  /// Permanently exclude `user` and purge their intervals. Idempotent.
  pub async fn forget(&self, user: &str) -> Result<()> {
    if user.is_empty() {
      return Err(Error::MissingUserId);
    }
    let mut presence = self.presence.write().await;
    let newly = presence.forgotten.insert(user.to_owned());
    let purged = presence.remove_intervals(user);
    if newly {
      info!(user, purged, "forgot user");
    }
    Ok(())
  }

  pub async fn is_forgotten(&self, user: &str) -> bool {
    self.presence.read().await.forgotten.contains(user)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// A snapshot of one user's intervals. Unknown users have none.
  pub async fn intervals(&self, user: &str) -> Result<Vec<Interval>> {
    self
      .presence
      .read()
      .await
      .lookup(user)
      .map(<[Interval]>::to_vec)
      .ok_or_else(|| Error::UserForgotten(user.to_owned()))
  }

  /// Snapshot of every user that has not been forgotten, sorted by id.
  pub async fn all_intervals(&self) -> BTreeMap<UserId, Vec<Interval>> {
    let presence = self.presence.read().await;
    presence
      .intervals
      .iter()
      .filter(|(user, _)| !presence.forgotten.contains(*user))
      .map(|(user, intervals)| (user.clone(), intervals.clone()))
      .collect()
  }

  // ── Metrics ───────────────────────────────────────────────────────────

  async fn with_intervals<T>(
    &self,
    user: &str,
    f: impl FnOnce(&[Interval]) -> T,
  ) -> Result<T> {
    let presence = self.presence.read().await;
    let intervals = presence
      .lookup(user)
      .ok_or_else(|| Error::UserForgotten(user.to_owned()))?;
    Ok(f(intervals))
  }

  pub async fn total(&self, user: &str, window: &Window, now: Timestamp) -> Result<i64> {
    self
      .with_intervals(user, |i| metrics::total(i, window, now))
      .await
  }

  pub async fn average(
    &self,
    user: &str,
    window: &Window,
    now: Timestamp,
    granularity: Granularity,
  ) -> Result<i64> {
    self
      .with_intervals(user, |i| metrics::average(i, window, now, granularity))
      .await
  }

  pub async fn min(
    &self,
    user: &str,
    window: &Window,
    now: Timestamp,
  ) -> Result<Option<i64>> {
    self
      .with_intervals(user, |i| metrics::min(i, window, now))
      .await
  }

  pub async fn max(&self, user: &str, window: &Window, now: Timestamp) -> Result<i64> {
    self
      .with_intervals(user, |i| metrics::max(i, window, now))
      .await
  }

  // ── Reports ───────────────────────────────────────────────────────────

  /// Save `config` under `name`, replacing any previous definition.
  pub async fn create_report(&self, name: impl Into<String>, config: ReportConfig) {
    let name = name.into();
    if config.metrics.contains(&MetricKind::Unknown) {
      warn!(report = %name, "report lists unknown metrics; they will be skipped");
    }
    info!(
      report = %name,
      metrics = config.metrics.len(),
      users = config.users.len(),
      "saved report config"
    );
    self.reports.write().await.insert(name, config);
  }

  pub async fn report_config(&self, name: &str) -> Option<ReportConfig> {
    self.reports.read().await.get(name).cloned()
  }

  /// Evaluate the saved report `name` over `window`.
  pub async fn report(
    &self,
    name: &str,
    window: &Window,
    now: Timestamp,
  ) -> Result<Report> {
    let config = self
      .report_config(name)
      .await
      .ok_or_else(|| Error::ReportNotFound(name.to_owned()))?;
    let presence = self.presence.read().await;
    Ok(report::build(&config, window, now, |user| presence.lookup(user)))
  }
}
