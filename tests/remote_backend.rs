use std::sync::Arc;
use std::time::Duration;

use cloud_leaderboard::client::throttle::Throttle;
use cloud_leaderboard::client::{DisabledReason, LeaderboardClient, RemoteProvider};
use cloud_leaderboard::common::config::{BackendConfig, LeaderboardConfig};
use cloud_leaderboard::common::messages::SCORES_COLLECTION;
use cloud_leaderboard::server::config::ServerInfo;
use cloud_leaderboard::server::{DocumentStore, ScoreServer, ServerConfig, ServerMetrics};

struct RunningServer {
    address: String,
    store: DocumentStore,
    metrics: ServerMetrics,
}

async fn start_server(attestation_site_key: Option<&str>, enforce_attestation: bool) -> RunningServer {
    start_server_with_ttl(attestation_site_key, enforce_attestation, 3600).await
}

async fn start_server_with_ttl(
    attestation_site_key: Option<&str>,
    enforce_attestation: bool,
    token_ttl_secs: u64,
) -> RunningServer {
    let config = ServerConfig {
        server: ServerInfo {
            address: "127.0.0.1:0".to_string(),
            project_id: "arcade".to_string(),
            api_key: "public-key".to_string(),
            attestation_site_key: attestation_site_key.map(str::to_string),
            enforce_attestation,
            token_ttl_secs,
        },
    };

    let server = ScoreServer::bind(config).await.unwrap();
    let running = RunningServer {
        address: server.local_addr().unwrap().to_string(),
        store: server.store(),
        metrics: server.metrics(),
    };
    tokio::spawn(server.run());
    running
}

fn client_config(address: &str, api_key: &str, site_key: Option<&str>) -> LeaderboardConfig {
    LeaderboardConfig {
        backend: Some(BackendConfig {
            project_id: "arcade".to_string(),
            api_key: api_key.to_string(),
            address: address.to_string(),
        }),
        attestation_site_key: site_key.map(str::to_string),
        debug: false,
    }
}

fn remote_client(config: LeaderboardConfig) -> LeaderboardClient {
    LeaderboardClient::new(config, Arc::new(RemoteProvider::new()))
        .with_throttle(Throttle::new(Duration::ZERO))
}

#[tokio::test]
async fn test_submit_and_read_over_tcp() {
    let server = start_server(None, false).await;
    let client = remote_client(client_config(&server.address, "public-key", None));

    assert!(client.ready().await);
    assert_eq!(client.disabled_reason(), None);

    assert!(client.submit_score("Alice123 https://evil.com", 4_999_999.7).await);
    assert!(client.submit_score("Bob", 250.0).await);
    assert!(!client.submit_score("Carol", 0.0).await);

    let top = client.get_top10().await;
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].name, "Alice123");
    assert_eq!(top[0].score, 1_000_000);
    assert_eq!(top[1].name, "Bob");
    assert!(top.iter().all(|entry| entry.created_at.timestamp() > 0));

    assert_eq!(server.store.len(SCORES_COLLECTION).await, 2);
    assert_eq!(server.metrics.get_sign_ins(), 1);
    assert_eq!(server.metrics.get_writes_accepted(), 2);
    assert_eq!(server.metrics.get_queries(), 1);
}

#[tokio::test]
async fn test_rejected_sign_in_leaves_reads_working() {
    let server = start_server(None, false).await;
    let writer = remote_client(client_config(&server.address, "public-key", None));
    assert!(writer.submit_score("Dana", 42.0).await);

    let client = remote_client(client_config(&server.address, "wrong-key", None));

    assert!(client.ready().await);
    assert_eq!(client.disabled_reason(), Some(DisabledReason::AuthFailed));
    assert!(!client.submit_score("Eve", 99.0).await);

    let top = client.get_top10().await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "Dana");
    assert_eq!(server.metrics.get_writes_rejected(), 1);
}

#[tokio::test]
async fn test_enforced_attestation() {
    let server = start_server(Some("site-key"), true).await;

    let attested = remote_client(client_config(&server.address, "public-key", Some("site-key")));
    assert!(attested.submit_score("Frank", 7.0).await);

    let wrong_key = remote_client(client_config(&server.address, "public-key", Some("other")));
    assert!(wrong_key.ready().await);
    assert!(!wrong_key.submit_score("Grace", 8.0).await);

    let without_key = remote_client(client_config(&server.address, "public-key", None));
    assert!(!without_key.submit_score("Heidi", 9.0).await);

    assert_eq!(server.store.len(SCORES_COLLECTION).await, 1);
}

#[tokio::test]
async fn test_expired_session_cannot_write() {
    let server = start_server_with_ttl(None, false, 0).await;
    let client = remote_client(client_config(&server.address, "public-key", None));

    assert!(client.ready().await);
    assert_eq!(client.disabled_reason(), None);
    assert!(!client.submit_score("Judy", 12.0).await);

    assert_eq!(server.store.len(SCORES_COLLECTION).await, 0);
    assert_eq!(server.metrics.get_writes_rejected(), 1);
}

#[tokio::test]
async fn test_unreachable_server_fails_quietly() {
    // Grab a free port and close it again so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let client = remote_client(client_config(&address, "public-key", None));

    assert!(!client.submit_score("Ivan", 10.0).await);
    assert!(client.get_top10().await.is_empty());
    assert_eq!(client.disabled_reason(), Some(DisabledReason::AuthFailed));
}
