pub mod api;
pub mod config;
pub mod mask;
pub mod server;
pub mod state;
pub mod types;

/// Shuffle affiliate stats feed for this site's campaign (public, no auth required)
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://affiliate.shuffle.com/stats/96cc7e48-64b2-4120-b07d-779f3a9fd870";

/// Default bind address for the proxy when LEADERBOARD_LISTEN_ADDR is unset
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
