pub mod server;
pub mod config;
pub mod metrics;
pub mod store;
pub mod tokens;

pub use server::ScoreServer;
pub use config::ServerConfig;
pub use metrics::ServerMetrics;
pub use store::DocumentStore;
