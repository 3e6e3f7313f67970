//! # Client Components
//!
//! ## Leaderboard Client ([`client`])
//! Lazy single-flight setup, input hygiene, submission throttling and the
//! ranked read. This is the only piece callers normally touch.
//!
//! ## Backend Capabilities ([`backend`])
//! The provider/module traits the client is written against, with two
//! implementations:
//! - [`remote`]: framed TCP to a score server
//! - [`local`]: an in-process document store
//!
//! ## Supporting Pieces
//! - [`throttle`]: one accepted submission per window
//! - [`entry`]: the normalized row type returned to callers
//! - [`error`]: failure taxonomy and diagnostic reasons
//! - [`metrics`]: per-submission outcome recording and JSON export

pub mod backend;
pub mod client;
pub mod entry;
pub mod error;
pub mod local;
pub mod metrics;
pub mod remote;
pub mod throttle;

// Re-export for convenience
pub use backend::BackendProvider;
pub use client::LeaderboardClient;
pub use entry::ScoreEntry;
pub use error::{DisabledReason, LeaderboardError};
pub use local::LocalProvider;
pub use metrics::ClientMetrics;
pub use remote::RemoteProvider;
