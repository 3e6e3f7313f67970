//! # Backend Capabilities
//!
//! The leaderboard client never talks to a concrete backend directly. It asks a
//! [`BackendProvider`] for four modules:
//!
//! | Module                  | Required | Used for                           |
//! |-------------------------|----------|------------------------------------|
//! | [`AppModule`]           | yes      | creating or reusing the [`App`]    |
//! | [`AuthModule`]          | yes      | anonymous sign-in                  |
//! | [`StoreModule`]         | yes      | obtaining a [`DataStore`] handle   |
//! | [`AttestationModule`]   | no       | best-effort bot attestation        |
//!
//! A failure to load the attestation module only disables attestation.
//!
//! Two providers ship with the crate: [`RemoteProvider`](super::remote::RemoteProvider)
//! speaks the framed TCP protocol to a score server, and
//! [`LocalProvider`](super::local::LocalProvider) works against an in-process
//! [`DocumentStore`](crate::server::DocumentStore).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::common::config::BackendConfig;
use crate::common::messages::Document;

/// Credentials picked up while initializing an [`App`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub uid: Option<String>,
    pub token: Option<String>,
    pub attestation: Option<String>,
}

/// An initialized backend application: project configuration plus session state.
#[derive(Debug)]
pub struct App {
    config: BackendConfig,
    session: RwLock<Session>,
}

impl App {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            session: RwLock::new(Session::default()),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn set_user(&self, uid: String, token: String) {
        let mut session = self.session.write().await;
        session.uid = Some(uid);
        session.token = Some(token);
    }

    pub async fn set_attestation(&self, token: String) {
        self.session.write().await.attestation = Some(token);
    }
}

/// Creates the backend app, or hands back the one already created.
pub trait AppModule: Send + Sync {
    fn existing_app(&self) -> Option<Arc<App>>;
    fn initialize_app(&self, config: &BackendConfig) -> Result<Arc<App>>;
}

#[async_trait]
pub trait AuthModule: Send + Sync {
    /// Sign in without credentials. Returns the anonymous uid.
    async fn sign_in_anonymously(&self, app: &App) -> Result<String>;
}

#[async_trait]
pub trait AttestationModule: Send + Sync {
    async fn activate(&self, app: &App, site_key: &str) -> Result<()>;
}

pub trait StoreModule: Send + Sync {
    fn store(&self, app: Arc<App>) -> Result<Arc<dyn DataStore>>;
}

/// Append-only document access.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Add a document. Fields named in `server_timestamp_fields` are filled with
    /// the backend's clock. Returns the new document id once the write is confirmed.
    async fn add_document(
        &self,
        collection: &str,
        fields: Document,
        server_timestamp_fields: &[&str],
    ) -> Result<String>;

    /// Documents ordered by a numeric field, at most `limit` of them.
    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
        limit: usize,
    ) -> Result<Vec<Document>>;
}

/// Source of backend modules. Each load may fail independently.
#[async_trait]
pub trait BackendProvider: Send + Sync {
    async fn load_app(&self) -> Result<Arc<dyn AppModule>>;
    async fn load_auth(&self) -> Result<Arc<dyn AuthModule>>;
    async fn load_store(&self) -> Result<Arc<dyn StoreModule>>;
    async fn load_attestation(&self) -> Result<Arc<dyn AttestationModule>>;
}

/// [`AppModule`] holding at most one [`App`] for every client that shares it.
#[derive(Debug, Default)]
pub struct AppRegistry {
    app: Mutex<Option<Arc<App>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AppModule for AppRegistry {
    fn existing_app(&self) -> Option<Arc<App>> {
        self.app.lock().ok()?.clone()
    }

    fn initialize_app(&self, config: &BackendConfig) -> Result<Arc<App>> {
        let mut slot = self
            .app
            .lock()
            .map_err(|_| anyhow!("app registry lock poisoned"))?;

        let app = slot.get_or_insert_with(|| Arc::new(App::new(config.clone())));
        Ok(app.clone())
    }
}
