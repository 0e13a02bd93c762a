//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<seen_core::Error> for ApiError {
  fn from(e: seen_core::Error) -> Self {
    match e {
      seen_core::Error::ReportNotFound(_) => {
        ApiError::NotFound("Report not found.".to_owned())
      }
      other => ApiError::BadRequest(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
    };
    tracing::debug!(%status, error = %message, "request rejected");
    (status, Json(json!({ "error": message }))).into_response()
  }
}
