//! Probe: fetch the upstream affiliate stats feed once and print it.
//!
//! Accepts optional startTime/endTime pass-through so upstream's own time
//! filtering can be checked by hand — the serving path deliberately avoids
//! it and windows via baseline subtraction instead.

use anyhow::Result;
use clap::Parser;

use shuffle_leaderboard::api::{UpstreamClient, WagerFetcher};
use shuffle_leaderboard::config::AppConfig;
use shuffle_leaderboard::mask::mask_username;

#[derive(Parser)]
#[command(
    name = "probe_stats",
    about = "Fetch the upstream affiliate stats feed once"
)]
struct Args {
    /// startTime (ms epoch) passed through to upstream
    #[arg(long)]
    start_time: Option<String>,

    /// endTime (ms epoch) passed through to upstream
    #[arg(long)]
    end_time: Option<String>,

    /// Maximum rows to print
    #[arg(long, default_value_t = 25)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::from_env()?;
    println!("Upstream: {}\n", config.upstream_url);

    let client = UpstreamClient::new(&config)?;
    let entries = client
        .fetch_totals(args.start_time.as_deref(), args.end_time.as_deref())
        .await;

    if entries.is_empty() {
        println!("No entries returned (empty board, upstream failure, or rate limit).");
        return Ok(());
    }

    println!("{} entries:\n", entries.len());
    println!("{:>4}  {:<24} {:<24} {:>14}", "#", "username", "masked", "wagerAmount");
    for (rank, entry) in entries.iter().take(args.limit).enumerate() {
        println!(
            "{:>4}. {:<24} {:<24} {:>14.2}",
            rank + 1,
            entry.username,
            mask_username(&entry.username),
            entry.wager_amount,
        );
    }
    if entries.len() > args.limit {
        println!("\n... {} more row(s) not shown", entries.len() - args.limit);
    }

    Ok(())
}
