//! Backend modules that talk to a [`ScoreServer`](crate::server::ScoreServer)
//! over the framed TCP protocol. Every call opens its own connection.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::backend::{
    App, AppModule, AppRegistry, AttestationModule, AuthModule, BackendProvider, DataStore,
    StoreModule,
};
use crate::common::connection::request;
use crate::common::messages::{Document, Message};

/// Provider for a score server reachable at the configured backend address.
#[derive(Debug, Clone, Default)]
pub struct RemoteProvider {
    apps: Arc<AppRegistry>,
}

impl RemoteProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackendProvider for RemoteProvider {
    async fn load_app(&self) -> Result<Arc<dyn AppModule>> {
        Ok(self.apps.clone())
    }

    async fn load_auth(&self) -> Result<Arc<dyn AuthModule>> {
        Ok(Arc::new(RemoteAuth))
    }

    async fn load_store(&self) -> Result<Arc<dyn StoreModule>> {
        Ok(Arc::new(RemoteStoreModule))
    }

    async fn load_attestation(&self) -> Result<Arc<dyn AttestationModule>> {
        Ok(Arc::new(RemoteAttestation))
    }
}

struct RemoteAuth;

#[async_trait]
impl AuthModule for RemoteAuth {
    async fn sign_in_anonymously(&self, app: &App) -> Result<String> {
        let config = app.config();
        let response = request(
            &config.address,
            &Message::SignInAnonymously {
                project_id: config.project_id.clone(),
                api_key: config.api_key.clone(),
            },
        )
        .await?;

        match response {
            Message::SignInResponse { uid, token } => {
                app.set_user(uid.clone(), token).await;
                Ok(uid)
            }
            other => Err(anyhow!("Unexpected sign-in response: {:?}", other)),
        }
    }
}

struct RemoteAttestation;

#[async_trait]
impl AttestationModule for RemoteAttestation {
    async fn activate(&self, app: &App, site_key: &str) -> Result<()> {
        let config = app.config();
        let response = request(
            &config.address,
            &Message::AttestationRequest {
                project_id: config.project_id.clone(),
                site_key: site_key.to_string(),
            },
        )
        .await?;

        match response {
            Message::AttestationResponse { token } => {
                app.set_attestation(token).await;
                Ok(())
            }
            other => Err(anyhow!("Unexpected attestation response: {:?}", other)),
        }
    }
}

struct RemoteStoreModule;

impl StoreModule for RemoteStoreModule {
    fn store(&self, app: Arc<App>) -> Result<Arc<dyn DataStore>> {
        Ok(Arc::new(RemoteDataStore { app }))
    }
}

struct RemoteDataStore {
    app: Arc<App>,
}

#[async_trait]
impl DataStore for RemoteDataStore {
    async fn add_document(
        &self,
        collection: &str,
        fields: Document,
        server_timestamp_fields: &[&str],
    ) -> Result<String> {
        let session = self.app.session().await;
        let response = request(
            &self.app.config().address,
            &Message::AddDocument {
                token: session.token,
                attestation: session.attestation,
                collection: collection.to_string(),
                fields,
                server_timestamp_fields: server_timestamp_fields
                    .iter()
                    .map(|field| field.to_string())
                    .collect(),
            },
        )
        .await?;

        match response {
            Message::DocumentAdded { id } => {
                debug!("Stored {}/{}", collection, id);
                Ok(id)
            }
            other => Err(anyhow!("Unexpected write response: {:?}", other)),
        }
    }

    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let response = request(
            &self.app.config().address,
            &Message::RunQuery {
                collection: collection.to_string(),
                order_by: order_by.to_string(),
                descending,
                limit,
            },
        )
        .await?;

        match response {
            Message::QueryResult { documents } => Ok(documents),
            other => Err(anyhow!("Unexpected query response: {:?}", other)),
        }
    }
}
