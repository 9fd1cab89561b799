use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::types::{UpstreamEntry, WagerEntry};

/// Attempts per serving fetch. An empty result is ambiguous: a genuinely
/// empty leaderboard looks the same as a swallowed upstream failure.
pub const FETCH_ATTEMPTS: u32 = 2;

/// Fixed pause between fetch attempts.
pub const FETCH_BACKOFF: Duration = Duration::from_secs(1);

/// Source of cumulative wager totals.
///
/// Implementations never error: any failure degrades to an empty list so
/// the request handler can fall back to the recorded baseline.
#[async_trait]
pub trait WagerFetcher: Send + Sync {
    async fn fetch_totals(
        &self,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Vec<WagerEntry>;
}

/// HTTP client for the Shuffle affiliate stats feed.
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            url: config.upstream_url.clone(),
        })
    }
}

#[async_trait]
impl WagerFetcher for UpstreamClient {
    async fn fetch_totals(
        &self,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Vec<WagerEntry> {
        let mut request = self.http.get(&self.url);
        if let Some(start) = start_time {
            request = request.query(&[("startTime", start)]);
        }
        if let Some(end) = end_time {
            request = request.query(&[("endTime", end)]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Upstream request failed: {err}");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            warn!("Upstream responded with {}", response.status());
            return Vec::new();
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!("Upstream response was not valid JSON: {err}");
                return Vec::new();
            }
        };

        let entries = decode_payload(body).unwrap_or_default();
        debug!("Fetched {} leaderboard entries", entries.len());
        entries
    }
}

/// Interpret an upstream response body.
///
/// Returns `None` when the body is not a leaderboard array — Shuffle
/// answers rate-limited calls with a 200 and a `{"message": "Too many
/// requests..."}` object. List elements that are not objects are skipped.
fn decode_payload(body: Value) -> Option<Vec<WagerEntry>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(ref fields) => {
            let message = fields.get("message").and_then(Value::as_str).unwrap_or("");
            if message.to_ascii_lowercase().contains("too many requests") {
                warn!("Upstream rate limit hit: {message}");
            } else {
                warn!("Unexpected upstream payload shape: {body}");
            }
            return None;
        }
        other => {
            warn!("Unexpected upstream payload shape: {other}");
            return None;
        }
    };

    let entries = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<UpstreamEntry>(item) {
            Ok(raw) => Some(WagerEntry::from(raw)),
            Err(err) => {
                warn!("Skipping malformed leaderboard entry: {err}");
                None
            }
        })
        .collect();
    Some(entries)
}

/// Bounds for the serving fetch loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: FETCH_ATTEMPTS,
            backoff: FETCH_BACKOFF,
        }
    }
}

/// Fetch all-time totals, retrying on an empty result.
///
/// The serving path never passes time filters: upstream's own windowing is
/// unreliable under rate limiting, so the window is simulated downstream by
/// baseline subtraction.
pub async fn fetch_with_retry(fetcher: &dyn WagerFetcher, retry: RetryPolicy) -> Vec<WagerEntry> {
    for attempt in 1..=retry.attempts {
        let entries = fetcher.fetch_totals(None, None).await;
        if !entries.is_empty() {
            return entries;
        }
        if attempt < retry.attempts {
            debug!(
                "Upstream returned no entries (attempt {attempt}/{}), retrying...",
                retry.attempts
            );
            tokio::time::sleep(retry.backoff).await;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Mutex;

    use super::*;

    // ── decode_payload ─────────────────────────────────────────────

    #[test]
    fn decodes_well_formed_array() {
        let body = json!([
            {"username": "Alice123", "wagerAmount": 100.5},
            {"username": "Bob", "wagerAmount": 20},
        ]);
        let entries = decode_payload(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "Alice123");
        assert_eq!(entries[0].wager_amount, 100.5);
        assert_eq!(entries[1].wager_amount, 20.0);
    }

    #[test]
    fn missing_and_null_fields_default() {
        let body = json!([
            {"wagerAmount": 5.0},
            {"username": "NoAmount"},
            {"username": "NullAmount", "wagerAmount": null},
            {"username": null, "wagerAmount": 1.0},
        ]);
        let entries = decode_payload(body).unwrap();
        assert_eq!(entries[0].username, "");
        assert_eq!(entries[1].wager_amount, 0.0);
        assert_eq!(entries[2].wager_amount, 0.0);
        assert_eq!(entries[3].username, "");
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let body = json!([{"username": "Keep", "wagerAmount": 1.0}, 42, "junk"]);
        let entries = decode_payload(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "Keep");
    }

    #[test]
    fn rate_limit_body_is_rejected() {
        let body = json!({"message": "Too many requests, please try again later."});
        assert!(decode_payload(body).is_none());
    }

    #[test]
    fn non_array_bodies_are_rejected() {
        assert!(decode_payload(json!({"error": "nope"})).is_none());
        assert!(decode_payload(json!("a string")).is_none());
        assert!(decode_payload(json!(7)).is_none());
        assert!(decode_payload(json!(null)).is_none());
    }

    // ── fetch_with_retry ───────────────────────────────────────────

    struct ScriptedFetcher {
        responses: Mutex<VecDeque<Vec<WagerEntry>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<Vec<WagerEntry>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WagerFetcher for ScriptedFetcher {
        async fn fetch_totals(
            &self,
            _start_time: Option<&str>,
            _end_time: Option<&str>,
        ) -> Vec<WagerEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().await.pop_front().unwrap_or_default()
        }
    }

    fn entry(username: &str, wager_amount: f64) -> WagerEntry {
        WagerEntry {
            username: username.to_string(),
            wager_amount,
        }
    }

    fn no_backoff() -> RetryPolicy {
        RetryPolicy {
            attempts: FETCH_ATTEMPTS,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn first_success_skips_retry() {
        let fetcher = ScriptedFetcher::new(vec![vec![entry("Alice123", 100.0)]]);
        let entries = fetch_with_retry(&fetcher, no_backoff()).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_result_is_retried_once() {
        let fetcher = ScriptedFetcher::new(vec![vec![], vec![entry("Bob", 20.0)]]);
        let entries = fetch_with_retry(&fetcher, no_backoff()).await;
        assert_eq!(entries, vec![entry("Bob", 20.0)]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let entries = fetch_with_retry(&fetcher, no_backoff()).await;
        assert!(entries.is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), FETCH_ATTEMPTS as usize);
    }
}
