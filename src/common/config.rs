//! # Configuration Utilities
//!
//! Shared configuration structures and parsing utilities used by both
//! client and server components.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;

/// Read and parse a TOML configuration file.
///
/// Errors name the offending path, so a bad `--config` argument is obvious
/// from the binary's exit message.
///
/// ```ignore
/// let config: LeaderboardConfig = load_config("config/client.toml")?;
/// ```
pub fn load_config<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read config file {}", path))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path))
}

/// Credentials and address of the hosted backend project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project identifier (e.g., "arcade-scores")
    pub project_id: String,
    /// Public API key for the project
    pub api_key: String,
    /// Network address of the score server (e.g., "127.0.0.1:7070")
    pub address: String,
}

/// Client-side leaderboard settings.
///
/// # Example TOML
///
/// ```toml
/// debug = true
/// attestation_site_key = "site-key-123"
///
/// [backend]
/// project_id = "arcade-scores"
/// api_key = "public-key"
/// address = "127.0.0.1:7070"
/// ```
///
/// A missing `[backend]` table is legal: the client then disables itself on first use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    pub backend: Option<BackendConfig>,
    /// Enables best-effort attestation when present
    pub attestation_site_key: Option<String>,
    /// Log diagnostic failures at warn instead of debug
    #[serde(default)]
    pub debug: bool,
}
