use serde::{Deserialize, Serialize};

/// Score server configuration loaded from TOML.
///
/// ```toml
/// [server]
/// address = "127.0.0.1:7070"
/// project_id = "arcade-scores"
/// api_key = "public-key"
/// attestation_site_key = "site-key-123"
/// enforce_attestation = false
/// token_ttl_secs = 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: ServerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Listen address (e.g., "127.0.0.1:7070", or port 0 for an ephemeral port)
    pub address: String,
    pub project_id: String,
    pub api_key: String,
    /// Site key clients must present to obtain an attestation token
    pub attestation_site_key: Option<String>,
    /// Refuse writes that carry no valid attestation token
    #[serde(default)]
    pub enforce_attestation: bool,
    /// Lifetime of session and attestation tokens, in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    3600
}
