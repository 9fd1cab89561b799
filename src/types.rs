use serde::{Deserialize, Serialize};

/// Raw leaderboard entry as the upstream API serves it.
///
/// The payload is untrusted: either field may be missing or null, and
/// Shuffle has shipped both. Normalization happens in [`WagerEntry::from`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub wager_amount: Option<f64>,
}

/// A normalized leaderboard entry: non-null username and cumulative
/// all-time wager total.
#[derive(Debug, Clone, PartialEq)]
pub struct WagerEntry {
    pub username: String,
    pub wager_amount: f64,
}

impl From<UpstreamEntry> for WagerEntry {
    fn from(raw: UpstreamEntry) -> Self {
        Self {
            username: raw.username.unwrap_or_default(),
            wager_amount: raw.wager_amount.unwrap_or(0.0),
        }
    }
}

/// One row served to the widget: masked username and the wager delta
/// since the leaderboard baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub username: String,
    pub wager_amount: f64,
}

/// Response envelope for `GET /api/leaderboard`.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub data: Vec<LeaderboardRow>,
    pub ended: bool,
}
