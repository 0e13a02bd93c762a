//! Tests for `Tracker` as a whole: store mutations, forgetting, and reports.

use std::sync::Arc;

use crate::{
  Applied, Error, Interval, Timestamp, Tracker, Window,
  metrics::Granularity,
  report::{MetricEntry, MetricKind, ReportConfig},
};

fn ts(s: &str) -> Timestamp { s.parse().unwrap() }

fn morning() -> Window {
  Window::parse("2023-10-19T08:00", "2023-10-19T09:00").unwrap()
}

const NOW: &str = "2023-10-25T12:00";

/// `u1` online 08:30–08:45 on 2023-10-19.
async fn tracker_with_u1() -> Tracker {
  let t = Tracker::new();
  t.append_open("u1", ts("2023-10-19T08:30")).await;
  t.close_open("u1", ts("2023-10-19T08:45"), ts(NOW)).await;
  t
}

fn open_count(intervals: &[Interval]) -> usize {
  intervals.iter().filter(|i| i.is_open()).count()
}

// ─── Interval store ──────────────────────────────────────────────────────────

#[tokio::test]
async fn append_open_is_idempotent() {
  let t = Tracker::new();
  assert_eq!(t.append_open("u", ts("2023-10-19T08:00")).await, Applied::Opened);
  assert_eq!(
    t.append_open("u", ts("2023-10-19T08:05")).await,
    Applied::AlreadyOpen
  );

  let intervals = t.intervals("u").await.unwrap();
  assert_eq!(intervals, vec![Interval::open(ts("2023-10-19T08:00"))]);
}

#[tokio::test]
async fn close_open_sets_end() {
  let t = Tracker::new();
  t.append_open("u", ts("2023-10-19T08:00")).await;
  assert_eq!(
    t.close_open("u", ts("2023-10-19T08:30"), ts(NOW)).await,
    Applied::Closed
  );

  let intervals = t.intervals("u").await.unwrap();
  assert_eq!(
    intervals,
    vec![Interval::closed(ts("2023-10-19T08:00"), ts("2023-10-19T08:30"))]
  );
}

#[tokio::test]
async fn close_without_open_backfills_from_fallback() {
  let t = Tracker::new();
  assert_eq!(
    t.close_open("u", ts("2023-10-19T08:30"), ts("2023-10-19T08:10")).await,
    Applied::Backfilled
  );

  let intervals = t.intervals("u").await.unwrap();
  assert_eq!(
    intervals,
    vec![Interval::closed(ts("2023-10-19T08:10"), ts("2023-10-19T08:30"))]
  );
}

#[tokio::test]
async fn open_interval_stays_last_under_mixed_samples() {
  let t = Tracker::new();
  let samples = [
    (true, "2023-10-19T08:00"),
    (true, "2023-10-19T08:01"),
    (false, "2023-10-19T08:02"),
    (false, "2023-10-19T08:03"),
    (true, "2023-10-19T08:04"),
    (false, "2023-10-19T08:05"),
    (true, "2023-10-19T08:06"),
    (true, "2023-10-19T08:07"),
  ];
  for (online, at) in samples {
    if online {
      t.append_open("u", ts(at)).await;
    } else {
      t.close_open("u", ts(at), ts(at)).await;
    }
    let intervals = t.intervals("u").await.unwrap();
    assert!(open_count(&intervals) <= 1);
    if let Some(pos) = intervals.iter().position(Interval::is_open) {
      assert_eq!(pos, intervals.len() - 1);
    }
  }

  let intervals = t.intervals("u").await.unwrap();
  assert_eq!(intervals.len(), 4);
  assert!(intervals[3].is_open());
}

#[tokio::test]
async fn unknown_user_has_no_intervals() {
  let t = Tracker::new();
  assert!(t.intervals("nobody").await.unwrap().is_empty());
  assert_eq!(t.total("nobody", &morning(), ts(NOW)).await.unwrap(), 0);
  assert_eq!(t.min("nobody", &morning(), ts(NOW)).await.unwrap(), None);
}

#[tokio::test]
async fn user_ids_are_case_sensitive() {
  let t = tracker_with_u1().await;
  assert!(t.intervals("U1").await.unwrap().is_empty());
}

#[tokio::test]
async fn purge_removes_intervals_but_does_not_forget() {
  let t = tracker_with_u1().await;
  assert_eq!(t.purge("u1").await, 1);
  assert!(t.intervals("u1").await.unwrap().is_empty());
  assert_eq!(t.append_open("u1", ts(NOW)).await, Applied::Opened);
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn metrics_for_single_interval() {
  let t = tracker_with_u1().await;
  let now = ts(NOW);
  assert_eq!(t.total("u1", &morning(), now).await.unwrap(), 900);
  assert_eq!(t.min("u1", &morning(), now).await.unwrap(), Some(900));
  assert_eq!(t.max("u1", &morning(), now).await.unwrap(), 900);
  assert_eq!(
    t.average("u1", &morning(), now, Granularity::Daily).await.unwrap(),
    900
  );
  assert_eq!(
    t.average("u1", &morning(), now, Granularity::Weekly).await.unwrap(),
    900
  );
}

// ─── Forget ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn forget_requires_user_id() {
  let t = Tracker::new();
  assert!(matches!(t.forget("").await, Err(Error::MissingUserId)));
}

#[tokio::test]
async fn forget_purges_and_blocks_reads() {
  let t = tracker_with_u1().await;
  t.forget("u1").await.unwrap();

  assert!(t.is_forgotten("u1").await);
  assert!(!t.all_intervals().await.contains_key("u1"));
  let now = ts(NOW);
  assert!(matches!(t.intervals("u1").await, Err(Error::UserForgotten(_))));
  assert!(matches!(t.total("u1", &morning(), now).await, Err(Error::UserForgotten(_))));
  assert!(matches!(
    t.average("u1", &morning(), now, Granularity::Weekly).await,
    Err(Error::UserForgotten(_))
  ));
  assert!(matches!(t.min("u1", &morning(), now).await, Err(Error::UserForgotten(_))));
  assert!(matches!(t.max("u1", &morning(), now).await, Err(Error::UserForgotten(_))));
}

#[tokio::test]
async fn forget_drops_later_ingestion() {
  let t = Tracker::new();
  t.forget("u").await.unwrap();
  assert_eq!(t.append_open("u", ts(NOW)).await, Applied::Dropped);
  assert_eq!(t.close_open("u", ts(NOW), ts(NOW)).await, Applied::Dropped);
  assert!(t.all_intervals().await.is_empty());
}

#[tokio::test]
async fn forget_is_idempotent() {
  let t = tracker_with_u1().await;
  t.append_open("u2", ts("2023-10-19T08:00")).await;
  t.forget("u1").await.unwrap();
  let once = t.all_intervals().await;
  t.forget("u1").await.unwrap();
  assert_eq!(t.all_intervals().await, once);
  assert_eq!(once.len(), 1);
}

#[tokio::test]
async fn all_intervals_lists_every_remaining_user() {
  let t = tracker_with_u1().await;
  t.append_open("u2", ts("2023-10-19T08:00")).await;
  let all = t.all_intervals().await;
  assert_eq!(all.keys().collect::<Vec<_>>(), ["u1", "u2"]);
  assert_eq!(all["u2"], vec![Interval::open(ts("2023-10-19T08:00"))]);
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_unknown_name_is_not_found() {
  let t = Tracker::new();
  let err = t.report("missing", &morning(), ts(NOW)).await.unwrap_err();
  assert!(matches!(err, Error::ReportNotFound(name) if name == "missing"));
}

#[tokio::test]
async fn report_total_matches_direct_total() {
  let t = tracker_with_u1().await;
  t.create_report("r", ReportConfig {
    metrics: vec![MetricKind::Total],
    users:   vec!["u1".into()],
  })
  .await;

  let now = ts(NOW);
  let report = t.report("r", &morning(), now).await.unwrap();
  let direct = t.total("u1", &morning(), now).await.unwrap();
  assert_eq!(report.users.len(), 1);
  assert_eq!(report.users[0].user_id, "u1");
  assert_eq!(
    report.users[0].metrics,
    vec![MetricEntry::Value {
      kind:  MetricKind::Total,
      value: Some(direct),
    }]
  );
}

#[tokio::test]
async fn create_report_overwrites() {
  let t = Tracker::new();
  t.create_report("r", ReportConfig {
    metrics: vec![MetricKind::Total],
    users:   vec!["a".into()],
  })
  .await;
  let replacement = ReportConfig {
    metrics: vec![MetricKind::Max],
    users:   vec!["b".into()],
  };
  t.create_report("r", replacement.clone()).await;
  assert_eq!(t.report_config("r").await, Some(replacement));
}

#[tokio::test]
async fn report_marks_forgotten_users() {
  let t = tracker_with_u1().await;
  t.create_report("r", ReportConfig {
    metrics: vec![MetricKind::Min, MetricKind::DailyAverage],
    users:   vec!["u1".into()],
  })
  .await;
  t.forget("u1").await.unwrap();

  let report = t.report("r", &morning(), ts(NOW)).await.unwrap();
  assert_eq!(report.users[0].metrics, vec![MetricEntry::Forgotten; 2]);
  assert_eq!(report.global.get(MetricKind::Min), Some(None));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_and_readers_keep_invariant() {
  let t = Arc::new(Tracker::new());
  let mut tasks = Vec::new();

  for worker in 0..4 {
    let t = t.clone();
    tasks.push(tokio::spawn(async move {
      for step in 0..200 {
        let at = ts("2023-10-19T08:00");
        if (step + worker) % 3 == 0 {
          t.close_open("shared", at, at).await;
        } else {
          t.append_open("shared", at).await;
        }
        let snapshot = t.intervals("shared").await.unwrap();
        assert!(snapshot.iter().filter(|i| i.is_open()).count() <= 1);
        if let Some(pos) = snapshot.iter().position(Interval::is_open) {
          assert_eq!(pos, snapshot.len() - 1);
        }
      }
    }));
  }

  for task in tasks {
    task.await.unwrap();
  }
}
