//! The `PresenceSource` trait and its HTTP implementation.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;

use crate::FetchError;

// ─── Payload ─────────────────────────────────────────────────────────────────

/// One user's presence as reported by the upstream feed.
///
/// Every field is optional on the wire; the ingestor decides what to do with
/// incomplete samples. Extra fields (nickname, avatar, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
  pub user_id:        Option<String>,
  pub is_online:      Option<bool>,
  /// Loosely formatted; see [`seen_core::time::normalize`].
  pub last_seen_date: Option<String>,
}

/// A page of samples. An empty `data` marks the end of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
  pub data: Vec<Sample>,
}

impl Page {
  pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Anything the ingestor can pull presence pages from.
pub trait PresenceSource: Send + Sync {
  /// Fetch the page starting at item `offset`.
  fn fetch_page(
    &self,
    offset: usize,
  ) -> impl Future<Output = Result<Page, FetchError>> + Send + '_;
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Polls `GET <url>?offset=<n>` on the upstream presence API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpSource {
  client: Client,
  url:    String,
}

impl HttpSource {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      url: url.into(),
    })
  }

  pub fn url(&self) -> &str { &self.url }
}

impl PresenceSource for HttpSource {
  async fn fetch_page(&self, offset: usize) -> Result<Page, FetchError> {
    let resp = self
      .client
      .get(&self.url)
      .query(&[("offset", offset)])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(FetchError::Status(resp.status()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_upstream_page() {
    let body = r#"{
      "total": 217,
      "data": [
        {
          "userId": "2fba2529-c166-8574-2da2-eac544d82634",
          "nickname": "Doug93",
          "isOnline": false,
          "lastSeenDate": "2023-10-19T08:30:12.1238164+00:00"
        },
        { "userId": "8b0b5db6-19d6-d777-575e-915c2a77959a", "isOnline": true, "lastSeenDate": null }
      ]
    }"#;
    let page: Page = serde_json::from_str(body).unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].is_online, Some(false));
    assert_eq!(
      page.data[0].last_seen_date.as_deref(),
      Some("2023-10-19T08:30:12.1238164+00:00")
    );
    assert_eq!(page.data[1].last_seen_date, None);
  }

  #[test]
  fn missing_data_is_malformed() {
    assert!(serde_json::from_str::<Page>(r#"{"total": 0}"#).is_err());
  }

  #[test]
  fn builds_client() {
    let source =
      HttpSource::new("http://localhost:9/api/users/lastSeen", Duration::from_secs(1))
        .unwrap();
    assert_eq!(source.url(), "http://localhost:9/api/users/lastSeen");
  }
}
