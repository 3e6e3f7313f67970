//! # Score Server
//!
//! Hosts the document store that leaderboard clients write to. Each TCP
//! connection carries one framed request and one framed response.
//!
//! The server plays the part of the backend's security rules: a write to
//! `scores` is only stored when it comes from a signed-in session and the
//! document is already in sanitized form. Timestamps listed by the client as
//! server-assigned are filled in here, never trusted from the wire.

use anyhow::{bail, Result};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use super::config::{ServerConfig, ServerInfo};
use super::metrics::ServerMetrics;
use super::store::DocumentStore;
use super::tokens::{TokenRegistry, MAX_LIVE_TOKENS};
use crate::common::connection::Connection;
use crate::common::messages::{Document, Message, Timestamp, SCORES_COLLECTION};
use crate::common::sanitize::{is_recordable_score, is_valid_name};

/// Longest page a single query may return.
const MAX_QUERY_LIMIT: usize = 100;

struct ServerState {
    config: ServerInfo,
    store: DocumentStore,
    /// Session token -> anonymous uid
    sessions: TokenRegistry<String>,
    attestations: TokenRegistry<()>,
    metrics: ServerMetrics,
}

/// TCP front end over a [`DocumentStore`].
pub struct ScoreServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl ScoreServer {
    /// Bind the configured address with a fresh, empty store.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        Self::bind_with_store(config, DocumentStore::new()).await
    }

    pub async fn bind_with_store(config: ServerConfig, store: DocumentStore) -> Result<Self> {
        let listener = TcpListener::bind(&config.server.address).await?;
        let ttl = Duration::from_secs(config.server.token_ttl_secs);

        Ok(Self {
            listener,
            state: Arc::new(ServerState {
                config: config.server,
                store,
                sessions: TokenRegistry::new(ttl, MAX_LIVE_TOKENS),
                attestations: TokenRegistry::new(ttl, MAX_LIVE_TOKENS),
                metrics: ServerMetrics::new(),
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn store(&self) -> DocumentStore {
        self.state.store.clone()
    }

    pub fn metrics(&self) -> ServerMetrics {
        self.state.metrics.clone()
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!(
                "🏆 Score server for project '{}' listening on {}",
                self.state.config.project_id, addr
            ),
            Err(e) => warn!("Score server listening on unknown address: {}", e),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            error!("❌ Connection from {} failed: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    error!("❌ Failed to accept connection: {}", e);
                    return;
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) -> Result<()> {
    let mut conn = Connection::new(stream);

    let Some(request) = conn.read_message().await? else {
        return Ok(());
    };

    let response = match state.handle(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Refused request: {}", e);
            Message::ErrorResponse {
                message: e.to_string(),
            }
        }
    };

    conn.write_message(&response).await?;
    debug!("📊 {}", state.metrics.summary());

    Ok(())
}

impl ServerState {
    async fn handle(&self, request: Message) -> Result<Message> {
        match request {
            Message::SignInAnonymously { project_id, api_key } => {
                self.check_project(&project_id)?;
                if api_key != self.config.api_key {
                    bail!("invalid api key");
                }

                let uid = Uuid::new_v4().to_string();
                let token = self.sessions.issue(uid.clone()).await;
                self.metrics.increment_sign_ins();

                info!("👤 Anonymous sign-in: {}", uid);
                Ok(Message::SignInResponse { uid, token })
            }

            Message::AttestationRequest { project_id, site_key } => {
                self.check_project(&project_id)?;
                match &self.config.attestation_site_key {
                    Some(expected) if *expected == site_key => {
                        let token = self.attestations.issue(()).await;
                        self.metrics.increment_attestations();
                        Ok(Message::AttestationResponse { token })
                    }
                    Some(_) => bail!("unknown attestation site key"),
                    None => bail!("attestation is not enabled for this project"),
                }
            }

            Message::AddDocument {
                token,
                attestation,
                collection,
                fields,
                server_timestamp_fields,
            } => {
                let result = self
                    .add_document(token, attestation, collection, fields, server_timestamp_fields)
                    .await;
                match &result {
                    Ok(_) => self.metrics.increment_writes_accepted(),
                    Err(_) => self.metrics.increment_writes_rejected(),
                }
                result
            }

            Message::RunQuery {
                collection,
                order_by,
                descending,
                limit,
            } => {
                let documents = self
                    .store
                    .query(&collection, &order_by, descending, limit.min(MAX_QUERY_LIMIT))
                    .await;
                self.metrics.increment_queries();
                Ok(Message::QueryResult { documents })
            }

            other => bail!("unexpected request: {:?}", other),
        }
    }

    fn check_project(&self, project_id: &str) -> Result<()> {
        if project_id != self.config.project_id {
            bail!("unknown project '{}'", project_id);
        }
        Ok(())
    }

    async fn add_document(
        &self,
        token: Option<String>,
        attestation: Option<String>,
        collection: String,
        mut fields: Document,
        server_timestamp_fields: Vec<String>,
    ) -> Result<Message> {
        let uid = match token {
            Some(token) => self.sessions.get(&token).await,
            None => None,
        };
        let Some(uid) = uid else {
            bail!("permission denied: not signed in");
        };

        if self.config.enforce_attestation {
            let attested = match attestation {
                Some(token) => self.attestations.get(&token).await.is_some(),
                None => false,
            };
            if !attested {
                bail!("permission denied: missing attestation");
            }
        }

        if collection.is_empty() {
            bail!("collection name must not be empty");
        }

        if collection == SCORES_COLLECTION {
            validate_score_document(&fields, &server_timestamp_fields)?;
        }

        let now = Timestamp::now().to_value();
        for field in server_timestamp_fields {
            fields.insert(field, now.clone());
        }

        let id = self.store.add(&collection, fields).await;
        info!("📝 {} added {}/{}", uid, collection, id);

        Ok(Message::DocumentAdded { id })
    }
}

/// Checks a `scores` write: exactly `name` and `score` from the client, with
/// `createdAt` left to the server.
pub fn validate_score_document<S: AsRef<str>>(
    fields: &Document,
    server_timestamp_fields: &[S],
) -> Result<()> {
    if fields.keys().any(|key| key != "name" && key != "score") {
        bail!("unexpected field in score document");
    }

    match fields.get("name") {
        Some(Value::String(name)) if is_valid_name(name) => {}
        _ => bail!("invalid name"),
    }

    let score = fields.get("score").and_then(Value::as_u64);
    match score.and_then(|s| u32::try_from(s).ok()) {
        Some(score) if is_recordable_score(score) => {}
        _ => bail!("invalid score"),
    }

    if server_timestamp_fields.len() != 1 || server_timestamp_fields[0].as_ref() != "createdAt" {
        bail!("createdAt must be server-assigned");
    }

    Ok(())
}
