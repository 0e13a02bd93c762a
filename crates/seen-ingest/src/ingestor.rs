//! The background task that turns presence samples into intervals.
//!
//! A *pass* walks the source page by page from offset 0 until a page comes
//! back empty or fails. Between passes the ingestor sleeps for the poll
//! interval. Cancellation is honoured while fetching and while sleeping.

use std::{sync::Arc, time::Duration};

use seen_core::{Applied, Timestamp, Tracker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::source::{Page, PresenceSource, Sample};

/// Counters for one pass, logged at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
  /// Non-empty pages processed.
  pub pages:   usize,
  /// Samples that changed or confirmed the store.
  pub applied: usize,
  /// Samples dropped as incomplete, unparsable, or for forgotten users.
  pub skipped: usize,
  /// Whether the pass ended on a fetch error rather than an empty page.
  pub failed:  bool,
}

pub struct Ingestor<S> {
  source:        S,
  tracker:       Arc<Tracker>,
  poll_interval: Duration,
}

impl<S: PresenceSource> Ingestor<S> {
  pub fn new(source: S, tracker: Arc<Tracker>, poll_interval: Duration) -> Self {
    Self {
      source,
      tracker,
      poll_interval,
    }
  }

  /// Run passes until `cancel` fires.
  pub async fn run(&self, cancel: CancellationToken) {
    info!(poll_interval = ?self.poll_interval, "presence ingestor started");
    loop {
      let stats = self.run_pass(&cancel).await;
      debug!(?stats, "ingest pass finished");

      if cancel.is_cancelled() {
        break;
      }
      debug!("waiting {:?} before the next pass", self.poll_interval);
      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = tokio::time::sleep(self.poll_interval) => {}
      }
    }
    info!("presence ingestor stopped");
  }

  /// Fetch and apply pages from offset 0 until an empty page, a fetch
  /// failure, or cancellation.
  pub async fn run_pass(&self, cancel: &CancellationToken) -> PassStats {
    let mut stats = PassStats::default();
    let mut offset = 0;

    loop {
      let fetched = tokio::select! {
        _ = cancel.cancelled() => break,
        fetched = self.source.fetch_page(offset) => fetched,
      };
      let page = match fetched {
        Ok(page) => page,
        Err(e) => {
          warn!(offset, error = %e, "failed to fetch presence page");
          stats.failed = true;
          break;
        }
      };
      if page.is_empty() {
        break;
      }

      let (applied, skipped) = self.process_page(&page, Timestamp::now()).await;
      stats.pages += 1;
      stats.applied += applied;
      stats.skipped += skipped;
      offset += page.data.len();
    }
    stats
  }

  /// Apply every sample in `page`, using `now` as the observation time.
  /// Returns `(applied, skipped)`.
  pub async fn process_page(&self, page: &Page, now: Timestamp) -> (usize, usize) {
    let mut applied = 0;
    let mut skipped = 0;
    for sample in &page.data {
      match self.apply(sample, now).await {
        Some(Applied::Dropped) | None => skipped += 1,
        Some(_) => applied += 1,
      }
    }
    (applied, skipped)
  }

  async fn apply(&self, sample: &Sample, now: Timestamp) -> Option<Applied> {
    let Some(user) = sample.user_id.as_deref().filter(|u| !u.is_empty()) else {
      warn!(?sample, "skipping sample without userId");
      return None;
    };
    if self.tracker.is_forgotten(user).await {
      return Some(Applied::Dropped);
    }

    let observed = now.truncate_to_minute();
    let outcome = if sample.is_online.unwrap_or(false) {
      self.tracker.append_open(user, observed).await
    } else {
      let Some(raw) = sample.last_seen_date.as_deref() else {
        warn!(user, "skipping offline sample without lastSeenDate");
        return None;
      };
      let last_seen = match raw.parse::<Timestamp>() {
        Ok(ts) => ts,
        Err(e) => {
          warn!(user, error = %e, "skipping sample with bad lastSeenDate");
          return None;
        }
      };
      self.tracker.close_open(user, last_seen, observed).await
    };

    debug!(user, ?outcome, "applied sample");
    Some(outcome)
  }
}
