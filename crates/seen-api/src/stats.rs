//! Handlers for `/stats/user/*` endpoints.
//!
//! | Method | Path | Response key |
//! |--------|------|--------------|
//! | `GET`  | `/stats/user/total`   | `totalTime` |
//! | `GET`  | `/stats/user/average` | `dailyAverage`, `weeklyAverage` or `total` per `granularity` |
//! | `GET`  | `/stats/user/min`     | `min` (`null` without data) |
//! | `GET`  | `/stats/user/max`     | `max` |
//!
//! All take `?userId=` plus optional `from` / `to` bounds. A forgotten user
//! yields `200 {"error": ...}` rather than an HTTP error.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use seen_core::{
  Error, Timestamp, Tracker, Window, metrics::Granularity,
  report::FORGOTTEN_MESSAGE,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
  pub user_id:     Option<String>,
  pub from:        Option<String>,
  pub to:          Option<String>,
  /// Only read by `/average`.
  #[serde(default)]
  pub granularity: Granularity,
}

impl StatsParams {
  fn user_id(&self) -> Result<&str, ApiError> {
    self
      .user_id
      .as_deref()
      .filter(|u| !u.is_empty())
      .ok_or_else(|| Error::MissingUserId.into())
  }

  fn window(&self) -> Result<Window, ApiError> {
    window(self.from.as_deref(), self.to.as_deref())
  }
}

/// Build a window from optional bounds; a missing bound is open-ended.
pub(crate) fn window(from: Option<&str>, to: Option<&str>) -> Result<Window, ApiError> {
  let from = from.map(str::parse::<Timestamp>).transpose()?.unwrap_or(Timestamp::MIN);
  let to = to.map(str::parse::<Timestamp>).transpose()?.unwrap_or(Timestamp::MAX);
  Ok(Window::new(from, to)?)
}

/// Wrap `result` as `{key: value}`, or the forgotten-user payload.
fn payload<T: Serialize>(
  key: &str,
  result: seen_core::Result<T>,
) -> Result<Json<Value>, ApiError> {
  match result {
    Ok(value) => {
      let mut body = Map::new();
      body.insert(key.to_owned(), json!(value));
      Ok(Json(Value::Object(body)))
    }
    Err(Error::UserForgotten(_)) => Ok(Json(json!({ "error": FORGOTTEN_MESSAGE }))),
    Err(e) => Err(e.into()),
  }
}

/// `GET /stats/user/total?userId=<id>[&from=...][&to=...]`
pub async fn total(
  State(tracker): State<Arc<Tracker>>,
  Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
  let user = params.user_id()?;
  let result = tracker.total(user, &params.window()?, Timestamp::now()).await;
  payload("totalTime", result)
}

/// `GET /stats/user/average?userId=<id>[&granularity=daily|weekly|total]`
pub async fn average(
  State(tracker): State<Arc<Tracker>>,
  Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
  let user = params.user_id()?;
  let granularity = params.granularity;
  let result = tracker
    .average(user, &params.window()?, Timestamp::now(), granularity)
    .await;
  payload(granularity.metric().key(), result)
}

/// `GET /stats/user/min?userId=<id>`
pub async fn min(
  State(tracker): State<Arc<Tracker>>,
  Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
  let user = params.user_id()?;
  let result = tracker.min(user, &params.window()?, Timestamp::now()).await;
  payload("min", result)
}

/// `GET /stats/user/max?userId=<id>`
pub async fn max(
  State(tracker): State<Arc<Tracker>>,
  Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
  let user = params.user_id()?;
  let result = tracker.max(user, &params.window()?, Timestamp::now()).await;
  payload("max", result)
}
