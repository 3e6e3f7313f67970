//! HTTP front end for the leaderboard client.
//!
//! Routes:
//! - `POST /api/scores` with `{"name": "...", "score": 123}` → `{"accepted": bool}`
//! - `GET /api/scores/top` → up to ten `{name, score, createdAt}` rows
//! - `GET /api/ready` → initialization outcome and diagnostic reason
//! - `GET /api/health`

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use cloud_leaderboard::client::{DisabledReason, LeaderboardClient, RemoteProvider, ScoreEntry};
use cloud_leaderboard::common::config::{load_config, LeaderboardConfig};
use cloud_leaderboard::common::sanitize::{name_from_value, score_from_value};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long, default_value = "config/client.toml")]
    config: String,

    /// Address to serve HTTP on
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Directory of static frontend files
    #[arg(long, default_value = "frontend/build")]
    static_dir: String,
}

/// Both fields are optional and untyped: a missing or malformed value is
/// normalized and the client decides, so the caller always gets
/// `{"accepted": bool}` back.
#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    score: Option<Value>,
}

impl SubmitRequest {
    fn name(&self) -> String {
        name_from_value(self.name.as_ref())
    }

    fn score(&self) -> f64 {
        score_from_value(self.score.as_ref()) as f64
    }
}

#[derive(Serialize)]
struct SubmitResponse {
    accepted: bool,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DisabledReason>,
}

struct AppState {
    client: Arc<LeaderboardClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    info!("🚀 Initializing web server...");

    let config: LeaderboardConfig = load_config(&args.config)?;
    let client = Arc::new(LeaderboardClient::new(config, Arc::new(RemoteProvider::new())));

    // Start setup now so the first request does not pay for it.
    let warmup = client.clone();
    tokio::spawn(async move {
        let ready = warmup.ready().await;
        info!("Leaderboard ready: {}", ready);
    });

    let state = Arc::new(AppState { client });

    let app = Router::new()
        .route("/api/scores", post(submit_score_handler))
        .route("/api/scores/top", get(top_scores_handler))
        .route("/api/ready", get(ready_handler))
        .route("/api/health", get(health_check))
        .fallback_service(ServeDir::new(&args.static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("🌐 Web server running on http://{}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leaderboard-api",
    }))
}

async fn ready_handler(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    let ready = state.client.ready().await;
    Json(ReadyResponse {
        ready,
        reason: state.client.disabled_reason(),
    })
}

async fn submit_score_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Json<SubmitResponse> {
    let accepted = state
        .client
        .submit_score(&request.name(), request.score())
        .await;
    Json(SubmitResponse { accepted })
}

async fn top_scores_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ScoreEntry>> {
    Json(state.client.get_top10().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> SubmitRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_submit_request_accepts_missing_or_malformed_fields() {
        let missing = parse(json!({ "name": "Alice" }));
        assert_eq!(missing.score(), 0.0);

        let text = parse(json!({ "name": "Alice", "score": "abc" }));
        assert_eq!(text.score(), 0.0);

        let null = parse(json!({ "score": null }));
        assert_eq!(null.name(), "Player");
        assert_eq!(null.score(), 0.0);
    }

    #[test]
    fn test_submit_request_normalizes_values() {
        let request = parse(json!({ "name": "Alice123 https://evil.com", "score": 4_999_999.7 }));
        assert_eq!(request.name(), "Alice123");
        assert_eq!(request.score(), 1_000_000.0);

        let numeric_name = parse(json!({ "name": 42, "score": 12.9 }));
        assert_eq!(numeric_name.name(), "42");
        assert_eq!(numeric_name.score(), 12.0);
    }
}
