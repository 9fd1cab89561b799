use std::time::Duration;

use anyhow::{Context, Result, ensure};

use crate::{DEFAULT_LISTEN_ADDR, DEFAULT_UPSTREAM_URL};

/// Upstream stats feed URL.
pub const UPSTREAM_URL_VAR: &str = "SHUFFLE_STATS_URL";

/// Upstream request timeout in seconds (float accepted).
pub const UPSTREAM_TIMEOUT_VAR: &str = "SHUFFLE_STATS_TIMEOUT";

/// Bind address for the HTTP server, e.g. `0.0.0.0:8080`.
pub const LISTEN_ADDR_VAR: &str = "LEADERBOARD_LISTEN_ADDR";

const DEFAULT_UPSTREAM_TIMEOUT_SECS: f64 = 8.0;

/// Runtime configuration, resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub listen_addr: String,
}

impl AppConfig {
    /// Resolve config from environment variables, falling back to the
    /// compiled-in defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let upstream_url = std::env::var(UPSTREAM_URL_VAR)
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string());

        let timeout_secs = match std::env::var(UPSTREAM_TIMEOUT_VAR) {
            Ok(raw) => raw
                .parse::<f64>()
                .with_context(|| format!("invalid {UPSTREAM_TIMEOUT_VAR}: {raw:?}"))?,
            Err(_) => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };
        ensure!(
            timeout_secs.is_finite() && timeout_secs > 0.0,
            "{UPSTREAM_TIMEOUT_VAR} must be a positive number of seconds, got {timeout_secs}"
        );

        let listen_addr = std::env::var(LISTEN_ADDR_VAR)
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            upstream_url,
            upstream_timeout: Duration::from_secs_f64(timeout_secs),
            listen_addr,
        })
    }
}
