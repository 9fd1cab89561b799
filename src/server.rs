use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;

use crate::api::{RetryPolicy, WagerFetcher, fetch_with_retry};
use crate::mask::mask_username;
use crate::state::{BaselineStore, EndTimeStore};
use crate::types::{LeaderboardResponse, LeaderboardRow};

/// The widget refreshes every 20 seconds; cached responses may lag up to
/// a minute behind upstream.
const CACHE_CONTROL_VALUE: &str = "public, max-age=60";

/// Shared services handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn WagerFetcher>,
    pub baselines: Arc<BaselineStore>,
    pub end_time: Arc<EndTimeStore>,
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/leaderboard", get(leaderboard))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQuery>,
) -> impl IntoResponse {
    let response = build_leaderboard(
        &state,
        params.start_time.as_deref(),
        params.end_time.as_deref(),
    )
    .await;
    ([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(response))
}

/// Assemble one leaderboard response.
///
/// This route never fails: every upstream or parameter problem degrades to
/// best-effort data behind a 200.
pub async fn build_leaderboard(
    state: &AppState,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> LeaderboardResponse {
    if let Some(raw) = end_time {
        match parse_millis(raw) {
            Some(millis) => state.end_time.record_end(millis).await,
            None => warn!("Ignoring unparseable endTime parameter: {raw:?}"),
        }
    }

    // Always fetch unfiltered all-time totals; the period window is
    // simulated by baseline subtraction (upstream's own time filtering is
    // unreliable under rate limiting).
    let entries = fetch_with_retry(state.fetcher.as_ref(), state.retry).await;

    let capture_baseline = match start_time {
        Some(raw) if parse_millis(raw).is_some() => true,
        Some(raw) => {
            warn!("Ignoring unparseable startTime parameter: {raw:?}");
            false
        }
        None => false,
    };
    if capture_baseline {
        state.baselines.capture(&entries).await;
    }

    let mut data = Vec::with_capacity(entries.len());
    for entry in &entries {
        let wager_amount = state
            .baselines
            .delta(&entry.username, entry.wager_amount)
            .await;
        data.push(LeaderboardRow {
            username: mask_username(&entry.username),
            wager_amount,
        });
    }

    if data.is_empty() {
        // Both attempts came back empty. Show known users at zero rather
        // than flashing an empty board on a transient upstream failure.
        data = state
            .baselines
            .usernames()
            .await
            .into_iter()
            .map(|name| LeaderboardRow {
                username: mask_username(&name),
                wager_amount: 0.0,
            })
            .collect();
    }

    LeaderboardResponse {
        data,
        ended: state.end_time.is_ended().await,
    }
}

fn parse_millis(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
