//! Process wiring for the `seen` presence tracker: configuration and the
//! top-level HTTP application.

use std::{path::Path, sync::Arc, time::Duration};

use axum::Router;
use seen_core::Tracker;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SEEN_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// Presence feed polled with `?offset=<n>`.
  pub upstream_url:         String,
  /// Pause between ingest passes.
  pub poll_interval_secs:   u64,
  pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 5000,
      upstream_url:         "https://sef.podkolzin.consulting/api/users/lastSeen"
        .to_string(),
      poll_interval_secs:   30,
      request_timeout_secs: 30,
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("SEEN"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The public router with request tracing.
pub fn app(tracker: Arc<Tracker>) -> Router {
  seen_api::router(tracker).layer(TraceLayer::new_for_http())
}
