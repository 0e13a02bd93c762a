//! seen-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), starts the
//! presence ingestor in the background, and serves the JSON API over HTTP.
//! Ctrl-C stops both.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use seen_core::Tracker;
use seen_ingest::{HttpSource, Ingestor};
use seen_server::ServerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Online presence tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let tracker = Arc::new(Tracker::new());
  let cancel = CancellationToken::new();

  // Background ingestion.
  let source = HttpSource::new(cfg.upstream_url.clone(), cfg.request_timeout())
    .context("failed to build upstream HTTP client")?;
  tracing::info!(upstream = %source.url(), "polling presence feed");
  let ingestor = Ingestor::new(source, tracker.clone(), cfg.poll_interval());
  let ingest_task = tokio::spawn({
    let cancel = cancel.clone();
    async move { ingestor.run(cancel).await }
  });

  // HTTP API.
  let app = seen_server::app(tracker);
  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(cancel.clone()))
    .await
    .context("server error")?;

  cancel.cancel();
  ingest_task.await.context("ingestor task failed")?;
  Ok(())
}

/// Resolve on Ctrl-C, or when something else cancels `cancel`.
async fn shutdown_signal(cancel: CancellationToken) {
  tokio::select! {
    result = tokio::signal::ctrl_c() => {
      if let Err(e) = result {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        cancel.cancelled().await;
      }
    }
    _ = cancel.cancelled() => {}
  }
  tracing::info!("shutting down");
  cancel.cancel();
}
