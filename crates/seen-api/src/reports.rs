//! Handlers for `/report/{name}` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/report/{name}` | Body: [`ReportConfig`]; replaces any existing definition, unknown metrics are kept |
//! | `GET`  | `/report/{name}` | `?from` and `?to` required; 404 before 400 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
};
use seen_core::{
  Timestamp, Tracker,
  report::{Report, ReportConfig},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{error::ApiError, stats::window};

/// `POST /report/{name}` — body: `{"metrics": [...], "users": [...]}`
pub async fn create(
  State(tracker): State<Arc<Tracker>>,
  Path(name): Path<String>,
  body: Result<Json<ReportConfig>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(config) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  tracker.create_report(name, config).await;
  Ok(Json(json!({})))
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
  pub from: Option<String>,
  pub to:   Option<String>,
}

/// `GET /report/{name}?from=<ts>&to=<ts>`
pub async fn get_one(
  State(tracker): State<Arc<Tracker>>,
  Path(name): Path<String>,
  Query(params): Query<WindowParams>,
) -> Result<Json<Report>, ApiError> {
  if tracker.report_config(&name).await.is_none() {
    return Err(seen_core::Error::ReportNotFound(name).into());
  }
  let (Some(from), Some(to)) = (params.from.as_deref(), params.to.as_deref()) else {
    return Err(ApiError::BadRequest(
      "Both 'from' and 'to' date parameters are required.".to_owned(),
    ));
  };
  let report = tracker
    .report(&name, &window(Some(from), Some(to))?, Timestamp::now())
    .await?;
  Ok(Json(report))
}
