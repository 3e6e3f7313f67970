//! # Leaderboard Client
//!
//! A single façade over the backend's `scores` collection.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──first call──▶ Initializing ──▶ Ready
//!                                            └─▶ Disabled (terminal)
//! ```
//!
//! Setup runs lazily, at most once per client, however many callers race for
//! it. It runs on its own tokio task: everyone awaits the same in-flight
//! attempt and sees the same outcome, and dropping a waiting caller (a
//! timeout, a disconnected HTTP request) leaves the attempt running.
//! A disabled client stays disabled; nothing retries.
//!
//! ## Failure Contract
//!
//! [`submit_score`](LeaderboardClient::submit_score) and
//! [`get_top10`](LeaderboardClient::get_top10) never fail: they answer `false`
//! or an empty list. The reason lands in
//! [`disabled_reason`](LeaderboardClient::disabled_reason), in the log, and in
//! the optional [`ClientMetrics`]. The `try_` variants return the typed
//! [`LeaderboardError`] instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config: LeaderboardConfig = load_config("config/client.toml")?;
//! let client = LeaderboardClient::new(config, Arc::new(RemoteProvider::new()));
//!
//! if client.submit_score("Alice", 4200.0).await {
//!     for entry in client.get_top10().await {
//!         println!("{} {}", entry.name, entry.score);
//!     }
//! }
//! ```

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use super::backend::{AttestationModule, BackendProvider, DataStore};
use super::entry::ScoreEntry;
use super::error::{DisabledReason, LeaderboardError};
use super::metrics::ClientMetrics;
use super::throttle::Throttle;
use crate::common::config::LeaderboardConfig;
use crate::common::messages::{Document, SCORES_COLLECTION};
use crate::common::sanitize::{clamp_score, is_recordable_score, sanitize_name};

/// Number of entries returned by [`LeaderboardClient::get_top10`].
pub const TOP_LIMIT: usize = 10;

/// What a successful setup leaves behind.
#[derive(Clone)]
struct Backend {
    store: Arc<dyn DataStore>,
}

/// The in-flight (or finished) setup. `None` means the client is disabled.
type SetupFuture = Shared<BoxFuture<'static, Option<Backend>>>;

/// Everything setup needs, shared with the task that runs it.
struct Setup {
    config: LeaderboardConfig,
    provider: Arc<dyn BackendProvider>,
    disabled_reason: Mutex<Option<DisabledReason>>,
}

pub struct LeaderboardClient {
    setup: Arc<Setup>,
    /// Filled by the first caller. The setup task it wraps runs on its own,
    /// so a caller that gives up waiting does not restart it.
    backend: Mutex<Option<SetupFuture>>,
    throttle: Throttle,
    metrics: Option<Arc<Mutex<ClientMetrics>>>,
}

impl LeaderboardClient {
    pub fn new(config: LeaderboardConfig, provider: Arc<dyn BackendProvider>) -> Self {
        Self {
            setup: Arc::new(Setup {
                config,
                provider,
                disabled_reason: Mutex::new(None),
            }),
            backend: Mutex::new(None),
            throttle: Throttle::default(),
            metrics: None,
        }
    }

    /// Replace the default 5 s submission throttle.
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Record every submission outcome into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Mutex<ClientMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Readiness signal: resolves to the initialization outcome.
    pub async fn ready(&self) -> bool {
        self.ensure_init().await
    }

    /// Run setup if nobody has yet, and report whether the client is usable.
    pub async fn ensure_init(&self) -> bool {
        self.backend().await.is_some()
    }

    /// The last diagnostic recorded during setup, if any.
    ///
    /// `auth_failed` can coexist with a ready client: reads still work.
    pub fn disabled_reason(&self) -> Option<DisabledReason> {
        self.setup.disabled_reason()
    }

    /// Submit a score. `true` only when the backend confirmed the write.
    pub async fn submit_score(&self, name: &str, score: f64) -> bool {
        let started = Instant::now();
        let result = self.try_submit_score(name, score).await;

        if let Some(metrics) = &self.metrics {
            let mut metrics = metrics.lock().unwrap_or_else(PoisonError::into_inner);
            metrics.record_submission(
                started.elapsed(),
                result.is_ok(),
                result.as_ref().err().map(|e| e.kind().to_string()),
            );
        }

        match result {
            Ok(()) => true,
            Err(e) => {
                self.diagnose(&format!("Score not submitted: {}", e));
                false
            }
        }
    }

    pub async fn try_submit_score(&self, name: &str, score: f64) -> Result<(), LeaderboardError> {
        let store = self.store().await?;

        if !self.throttle.try_pass() {
            return Err(LeaderboardError::Throttled);
        }

        let name = sanitize_name(name);
        let score = clamp_score(score);
        if !is_recordable_score(score) {
            return Err(LeaderboardError::InvalidScore);
        }

        let mut fields = Document::new();
        fields.insert("name".to_string(), Value::from(name.clone()));
        fields.insert("score".to_string(), Value::from(score));

        store
            .add_document(SCORES_COLLECTION, fields, &["createdAt"])
            .await
            .map_err(|e| LeaderboardError::Write(e.to_string()))?;

        info!("🏆 Recorded score {} for '{}'", score, name);
        Ok(())
    }

    /// Up to ten entries, highest score first. Empty when anything goes wrong.
    pub async fn get_top10(&self) -> Vec<ScoreEntry> {
        match self.try_get_top10().await {
            Ok(entries) => entries,
            Err(e) => {
                self.diagnose(&format!("Leaderboard unavailable: {}", e));
                Vec::new()
            }
        }
    }

    /// Entries keep the backend's order; ties are not re-sorted here.
    pub async fn try_get_top10(&self) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        let store = self.store().await?;

        let documents = store
            .query(SCORES_COLLECTION, "score", true, TOP_LIMIT)
            .await
            .map_err(|e| LeaderboardError::Read(e.to_string()))?;

        Ok(documents
            .iter()
            .take(TOP_LIMIT)
            .map(ScoreEntry::from_document)
            .collect())
    }

    async fn backend(&self) -> Option<Backend> {
        let setup = {
            let mut slot = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
            slot.get_or_insert_with(|| spawn_setup(self.setup.clone())).clone()
        };
        setup.await
    }

    async fn store(&self) -> Result<Arc<dyn DataStore>, LeaderboardError> {
        match self.backend().await {
            Some(backend) => Ok(backend.store),
            None => Err(match self.disabled_reason() {
                Some(DisabledReason::NoConfig) => LeaderboardError::ConfigMissing,
                reason => LeaderboardError::Init(
                    reason.unwrap_or(DisabledReason::InitFailed).to_string(),
                ),
            }),
        }
    }

    fn diagnose(&self, message: &str) {
        self.setup.diagnose(message);
    }
}

/// Start setup on the runtime and hand back a future every caller can await.
fn spawn_setup(setup: Arc<Setup>) -> SetupFuture {
    let task = tokio::spawn({
        let setup = setup.clone();
        async move { setup.initialize().await }
    });

    async move {
        match task.await {
            Ok(backend) => backend,
            Err(e) => {
                setup.record_reason(DisabledReason::InitFailed);
                setup.diagnose(&format!("Init task aborted: {}", e));
                None
            }
        }
    }
    .boxed()
    .shared()
}

impl Setup {
    fn disabled_reason(&self) -> Option<DisabledReason> {
        *self
            .disabled_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn initialize(&self) -> Option<Backend> {
        match self.try_initialize().await {
            Ok(backend) => {
                info!("✅ Leaderboard ready");
                Some(backend)
            }
            Err(LeaderboardError::ConfigMissing) => {
                self.record_reason(DisabledReason::NoConfig);
                self.diagnose("No backend configuration; leaderboard disabled");
                None
            }
            Err(e) => {
                self.record_reason(DisabledReason::InitFailed);
                self.diagnose(&format!("Init failed: {}", e));
                None
            }
        }
    }

    async fn try_initialize(&self) -> Result<Backend, LeaderboardError> {
        let backend_config = self
            .config
            .backend
            .as_ref()
            .ok_or(LeaderboardError::ConfigMissing)?;

        let (app_module, auth_module, store_module, attestation_module) = tokio::join!(
            self.provider.load_app(),
            self.provider.load_auth(),
            self.provider.load_store(),
            self.provider.load_attestation(),
        );

        let app_module = app_module.map_err(|e| init_error("app module", e))?;
        let auth_module = auth_module.map_err(|e| init_error("auth module", e))?;
        let store_module = store_module.map_err(|e| init_error("store module", e))?;
        let attestation_module: Option<Arc<dyn AttestationModule>> = match attestation_module {
            Ok(module) => Some(module),
            Err(e) => {
                self.diagnose(&LeaderboardError::ModuleLoad(e.to_string()).to_string());
                None
            }
        };

        let app = match app_module.existing_app() {
            Some(app) => app,
            None => app_module
                .initialize_app(backend_config)
                .map_err(|e| init_error("app", e))?,
        };

        if let (Some(module), Some(site_key)) =
            (&attestation_module, &self.config.attestation_site_key)
        {
            match module.activate(&app, site_key).await {
                Ok(()) => debug!("Attestation active"),
                Err(e) => self.diagnose(&format!("Attestation skipped: {}", e)),
            }
        }

        match auth_module.sign_in_anonymously(&app).await {
            Ok(uid) => debug!("Signed in anonymously as {}", uid),
            Err(e) => {
                // Reads of public data can still work without a session.
                self.record_reason(DisabledReason::AuthFailed);
                self.diagnose(&LeaderboardError::Auth(e.to_string()).to_string());
            }
        }

        let store = store_module
            .store(app)
            .map_err(|e| init_error("data store", e))?;

        Ok(Backend { store })
    }

    fn record_reason(&self, reason: DisabledReason) {
        *self
            .disabled_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason);
    }

    fn diagnose(&self, message: &str) {
        if self.config.debug {
            warn!("[Leaderboard] {}", message);
        } else {
            debug!("[Leaderboard] {}", message);
        }
    }
}

fn init_error(stage: &str, error: anyhow::Error) -> LeaderboardError {
    LeaderboardError::Init(format!("{}: {}", stage, error))
}
