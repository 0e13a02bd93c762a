//! JSON HTTP API for `seen`.
//!
//! Exposes an axum [`Router`] over a shared [`Tracker`]. Transport concerns
//! (binding, tracing layers, shutdown) are the caller's responsibility.

pub mod error;
pub mod intervals;
pub mod reports;
pub mod stats;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use seen_core::Tracker;

pub use error::ApiError;

/// Routes mounted under `/api`.
pub fn api_router(tracker: Arc<Tracker>) -> Router<()> {
  Router::new()
    // Stats
    .route("/stats/user/total", get(stats::total))
    .route("/stats/user/average", get(stats::average))
    .route("/stats/user/min", get(stats::min))
    .route("/stats/user/max", get(stats::max))
    // Retention
    .route("/user/forget", post(users::forget))
    // Reports
    .route("/report/{name}", get(reports::get_one).post(reports::create))
    .with_state(tracker)
}

/// The full public surface: `/user_intervals` plus everything under `/api`.
pub fn router(tracker: Arc<Tracker>) -> Router<()> {
  Router::new()
    .route("/user_intervals", get(intervals::list))
    .with_state(tracker.clone())
    .nest("/api", api_router(tracker))
}
