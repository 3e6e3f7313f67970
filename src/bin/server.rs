//! # Score Server Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! ```
//!
//! The server will:
//! 1. Load configuration from the specified TOML file
//! 2. Bind the configured address
//! 3. Serve sign-in, attestation, score writes and ranked queries

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use cloud_leaderboard::common::config::load_config;
use cloud_leaderboard::server::{ScoreServer, ServerConfig};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    ///
    /// Example: config/server.toml
    #[arg(short, long)]
    config: String,
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

    let config: ServerConfig = load_config(&args.config)?;
    let server = ScoreServer::bind(config).await?;

    server.run().await;

    Ok(())
}
