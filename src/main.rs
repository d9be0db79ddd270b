//! Review Doctor binary entrypoint.
//! Loads configuration, wires the Slack client and rewriter, and serves the webhook routes.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use review_doctor::{api, bootstrap, config::AppConfig, metrics::Metrics};

/// `RUST_LOG` filters (default `review_doctor=info,tower_http=info`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("review_doctor=info,tower_http=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    info!(?config, "configuration loaded");

    let state = bootstrap::build_state(&config).await?;
    let tasks = state.tasks().clone();
    let mut app = api::router(state);

    if config.server.metrics_enabled {
        match Metrics::init() {
            Ok(metrics) => app = app.merge(metrics.router()),
            Err(e) => warn!(error = %e, "metrics recorder not installed; /metrics disabled"),
        }
    }

    let addr = config.server.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "review-doctor listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    // Acknowledged commands still owe the channel a post.
    tasks.close();
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    if tokio::time::timeout(grace, tasks.wait()).await.is_err() {
        warn!(pending = tasks.len(), ?grace, "shutdown grace elapsed; dropping background tasks");
    }
    info!("review-doctor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}
