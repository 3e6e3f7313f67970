pub mod client;
pub mod common;
pub mod server;

pub use client::{LeaderboardClient, ScoreEntry};
pub use common::config::LeaderboardConfig;
pub use server::ScoreServer;
