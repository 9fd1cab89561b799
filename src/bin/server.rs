use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use shuffle_leaderboard::api::{RetryPolicy, UpstreamClient};
use shuffle_leaderboard::config::AppConfig;
use shuffle_leaderboard::server::{AppState, build_router};
use shuffle_leaderboard::state::{BaselineStore, EndTimeStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    info!(
        "Upstream: {} (timeout {:.1}s)",
        config.upstream_url,
        config.upstream_timeout.as_secs_f64(),
    );

    let state = AppState {
        fetcher: Arc::new(UpstreamClient::new(&config)?),
        baselines: Arc::new(BaselineStore::new()),
        end_time: Arc::new(EndTimeStore::new()),
        retry: RetryPolicy::default(),
    };
    let app = build_router(state);

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
