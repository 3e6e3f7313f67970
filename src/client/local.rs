//! In-process backend over a shared [`DocumentStore`].
//!
//! Applies the same write rules as the score server, so a client wired to this
//! provider behaves like one talking to a real server, minus the network.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::backend::{
    App, AppModule, AppRegistry, AttestationModule, AuthModule, BackendProvider, DataStore,
    StoreModule,
};
use crate::common::messages::{Document, Timestamp, SCORES_COLLECTION};
use crate::server::server::validate_score_document;
use crate::server::store::DocumentStore;

#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    store: DocumentStore,
    apps: Arc<AppRegistry>,
}

impl LocalProvider {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            apps: Arc::new(AppRegistry::new()),
        }
    }
}

#[async_trait]
impl BackendProvider for LocalProvider {
    async fn load_app(&self) -> Result<Arc<dyn AppModule>> {
        Ok(self.apps.clone())
    }

    async fn load_auth(&self) -> Result<Arc<dyn AuthModule>> {
        Ok(Arc::new(LocalAuth))
    }

    async fn load_store(&self) -> Result<Arc<dyn StoreModule>> {
        Ok(Arc::new(LocalStoreModule {
            store: self.store.clone(),
        }))
    }

    async fn load_attestation(&self) -> Result<Arc<dyn AttestationModule>> {
        Ok(Arc::new(LocalAttestation))
    }
}

struct LocalAuth;

#[async_trait]
impl AuthModule for LocalAuth {
    async fn sign_in_anonymously(&self, app: &App) -> Result<String> {
        let uid = format!("local-{}", Uuid::new_v4());
        app.set_user(uid.clone(), Uuid::new_v4().to_string()).await;
        Ok(uid)
    }
}

struct LocalAttestation;

#[async_trait]
impl AttestationModule for LocalAttestation {
    async fn activate(&self, app: &App, site_key: &str) -> Result<()> {
        if site_key.is_empty() {
            bail!("empty attestation site key");
        }
        app.set_attestation(Uuid::new_v4().to_string()).await;
        Ok(())
    }
}

struct LocalStoreModule {
    store: DocumentStore,
}

impl StoreModule for LocalStoreModule {
    fn store(&self, app: Arc<App>) -> Result<Arc<dyn DataStore>> {
        Ok(Arc::new(LocalDataStore {
            store: self.store.clone(),
            app,
        }))
    }
}

struct LocalDataStore {
    store: DocumentStore,
    app: Arc<App>,
}

#[async_trait]
impl DataStore for LocalDataStore {
    async fn add_document(
        &self,
        collection: &str,
        mut fields: Document,
        server_timestamp_fields: &[&str],
    ) -> Result<String> {
        if self.app.session().await.token.is_none() {
            bail!("permission denied: not signed in");
        }
        if collection.is_empty() {
            bail!("collection name must not be empty");
        }
        if collection == SCORES_COLLECTION {
            validate_score_document(&fields, server_timestamp_fields)?;
        }

        let now = Timestamp::now().to_value();
        for field in server_timestamp_fields {
            fields.insert(field.to_string(), now.clone());
        }

        Ok(self.store.add(collection, fields).await)
    }

    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
        limit: usize,
    ) -> Result<Vec<Document>> {
        Ok(self.store.query(collection, order_by, descending, limit).await)
    }
}
