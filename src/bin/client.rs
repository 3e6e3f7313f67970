//! # Leaderboard Client Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- --config config/client.toml submit --name Alice --score 4200
//! cargo run --bin client -- --config config/client.toml top
//! ```
//!
//! With metrics:
//! ```bash
//! cargo run --bin client -- --config config/client.toml \
//!   --metrics-output ./metrics/client.json submit --name Alice --score 4200
//! ```

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::{Arc, Mutex};

use cloud_leaderboard::client::{ClientMetrics, LeaderboardClient, RemoteProvider};
use cloud_leaderboard::common::config::{load_config, LeaderboardConfig};

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: String,

    /// Path to write metrics JSON output (optional)
    #[arg(long)]
    metrics_output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one score
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },
    /// Print the ten best scores
    Top,
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let config: LeaderboardConfig = load_config(&args.config)?;
    let mut client = LeaderboardClient::new(config, Arc::new(RemoteProvider::new()));

    let metrics = if args.metrics_output.is_some() {
        let m = Arc::new(Mutex::new(ClientMetrics::new("cli".to_string())));
        client = client.with_metrics(m.clone());
        Some(m)
    } else {
        None
    };

    if !client.ready().await {
        let reason = client
            .disabled_reason()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        eprintln!("Leaderboard disabled ({})", reason);
    }

    match args.command {
        Command::Submit { name, score } => {
            if client.submit_score(&name, score).await {
                println!("Score submitted");
            } else {
                println!("Score not submitted");
            }
        }
        Command::Top => {
            let entries = client.get_top10().await;
            if entries.is_empty() {
                println!("No scores yet");
            }
            for (rank, entry) in entries.iter().enumerate() {
                println!(
                    "{:>2}. {:<24} {:>7}  {}",
                    rank + 1,
                    entry.name,
                    entry.score,
                    entry.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }

    if let (Some(metrics), Some(output_path)) = (metrics, args.metrics_output) {
        let metrics = metrics.lock().map_err(|_| anyhow::anyhow!("metrics lock poisoned"))?;
        metrics.export_to_json(&output_path)?;
        println!("Metrics exported to: {}", output_path);
    }

    Ok(())
}
