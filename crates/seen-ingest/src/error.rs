//! Error type for fetching presence pages.

use thiserror::Error;

/// Why a page could not be fetched. Never fatal: the ingestor logs it and
/// treats the page as empty.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("upstream returned {0}")]
  Status(reqwest::StatusCode),

  #[error("malformed payload: {0}")]
  Decode(#[from] serde_json::Error),
}
