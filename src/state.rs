use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::WagerEntry;

/// Wager totals recorded at the start of the leaderboard period, keyed by
/// raw (unmasked) username.
///
/// The upstream feed only serves cumulative all-time totals, so the first
/// successful fetch after the period opens is captured here and subtracted
/// from every later total to show only new activity. Insert-only: a
/// username's baseline never changes for the lifetime of the process, and
/// a new period requires a restart.
pub struct BaselineStore {
    inner: Mutex<BaselineInner>,
}

#[derive(Default)]
struct BaselineInner {
    amounts: HashMap<String, f64>,
    captured: bool,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BaselineInner::default()),
        }
    }

    /// Record baselines for any usernames not seen before. Returns the
    /// number of newly inserted entries.
    ///
    /// Marks the store as captured even when `entries` is empty, so a
    /// period with no upstream data settles instead of re-arming forever.
    pub async fn capture(&self, entries: &[WagerEntry]) -> usize {
        let mut inner = self.inner.lock().await;
        let first_attempt = !inner.captured;
        inner.captured = true;

        let mut inserted = 0;
        for entry in entries {
            inner
                .amounts
                .entry(entry.username.clone())
                .or_insert_with(|| {
                    inserted += 1;
                    entry.wager_amount
                });
        }

        if first_attempt {
            info!("Baseline captured for {} user(s)", inner.amounts.len());
        } else if inserted > 0 {
            debug!("Added {inserted} new user(s) to baseline");
        }
        inserted
    }

    /// New wagers since baseline, clamped to zero. Upstream occasionally
    /// corrects totals downward; a negative delta is never shown.
    pub async fn delta(&self, username: &str, current: f64) -> f64 {
        let inner = self.inner.lock().await;
        let baseline = inner.amounts.get(username).copied().unwrap_or(0.0);
        (current - baseline).max(0.0)
    }

    /// Raw usernames with a recorded baseline, sorted for stable output.
    pub async fn usernames(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut names: Vec<String> = inner.amounts.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.amounts.is_empty()
    }

    /// Whether a capture has ever been attempted this process lifetime.
    pub async fn capture_attempted(&self) -> bool {
        self.inner.lock().await.captured
    }
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The instant the leaderboard period closes, if announced.
///
/// Earliest-wins: the widget may announce different end times across
/// requests, and the period definitely ends no later than the earliest one.
pub struct EndTimeStore {
    inner: Mutex<Option<DateTime<Utc>>>,
}

impl EndTimeStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Record a millisecond-epoch end time. Out-of-range values are
    /// ignored with a warning.
    pub async fn record_end(&self, millis: i64) {
        let Some(end) = Utc.timestamp_millis_opt(millis).single() else {
            warn!("Ignoring out-of-range end time: {millis}");
            return;
        };

        let mut stored = self.inner.lock().await;
        match *stored {
            Some(current) if current <= end => {}
            _ => {
                info!("Leaderboard end time set to {end}");
                *stored = Some(end);
            }
        }
    }

    /// Whether the leaderboard period is over. False while no end time has
    /// been announced.
    pub async fn is_ended(&self) -> bool {
        match *self.inner.lock().await {
            Some(end) => Utc::now() >= end,
            None => false,
        }
    }

    pub async fn ends_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.lock().await
    }
}

impl Default for EndTimeStore {
    fn default() -> Self {
        Self::new()
    }
}
