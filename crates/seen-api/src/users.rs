//! Handler for `POST /user/forget`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use seen_core::Tracker;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetParams {
  pub user_id: Option<String>,
}

/// `POST /user/forget?userId=<id>` — purge the user and ignore them from now
/// on. Forgetting twice is fine.
pub async fn forget(
  State(tracker): State<Arc<Tracker>>,
  Query(params): Query<ForgetParams>,
) -> Result<Json<Value>, ApiError> {
  let user_id = params.user_id.unwrap_or_default();
  tracker.forget(&user_id).await?;
  Ok(Json(json!({ "userId": user_id })))
}
