//! Handler for `GET /user_intervals`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{Json, extract::State};
use seen_core::{Interval, Tracker, UserId};

/// `GET /user_intervals` — every remembered user's raw intervals.
pub async fn list(
  State(tracker): State<Arc<Tracker>>,
) -> Json<BTreeMap<UserId, Vec<Interval>>> {
  Json(tracker.all_intervals().await)
}
