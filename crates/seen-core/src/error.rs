//! Error types for `seen-core`.

use thiserror::Error;

use crate::{interval::UserId, time::Timestamp};

#[derive(Debug, Error)]
pub enum Error {
  #[error("report not found: {0}")]
  ReportNotFound(String),

  #[error("Missing 'userId' parameter in the request.")]
  MissingUserId,

  #[error("user {0} has been forgotten")]
  UserForgotten(UserId),

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("window start {from} is after window end {to}")]
  InvalidWindow { from: Timestamp, to: Timestamp },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
