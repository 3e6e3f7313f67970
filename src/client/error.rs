use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a leaderboard operation did not happen.
///
/// The opaque client methods swallow these; the `try_` variants return them.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("no backend configuration")]
    ConfigMissing,
    #[error("optional module failed to load: {0}")]
    ModuleLoad(String),
    #[error("anonymous sign-in failed: {0}")]
    Auth(String),
    #[error("initialization failed: {0}")]
    Init(String),
    #[error("submission throttled")]
    Throttled,
    #[error("score is not recordable")]
    InvalidScore,
    #[error("write failed: {0}")]
    Write(String),
    #[error("read failed: {0}")]
    Read(String),
}

impl LeaderboardError {
    /// Stable short name, used as the failure reason in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "config_missing",
            Self::ModuleLoad(_) => "module_load",
            Self::Auth(_) => "auth_failed",
            Self::Init(_) => "init_failed",
            Self::Throttled => "throttled",
            Self::InvalidScore => "invalid_score",
            Self::Write(_) => "write_failed",
            Self::Read(_) => "read_failed",
        }
    }
}

/// Diagnostic reason recorded on the client when setup degrades or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledReason {
    NoConfig,
    AuthFailed,
    InitFailed,
}

impl DisabledReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoConfig => "no_config",
            Self::AuthFailed => "auth_failed",
            Self::InitFailed => "init_failed",
        }
    }
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
