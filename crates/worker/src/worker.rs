//! The worker context: one process-wide object per worker version.
//!
//! Collaborators (cache database, transport, client registry, sync
//! registry) are injected rather than reached for as globals, so a context
//! is fully driveable from tests and from embedding hosts.

use std::sync::Arc;

use coinstash_core::{AppConfig, CacheDb, CacheNames, Error};
use tokio::sync::RwLock;
use url::Url;

use crate::lifecycle::{WorkerId, WorkerState};
use crate::messaging::Clients;
use crate::net::Network;
use crate::sync::SyncRegistry;

/// Interception policy shared by every worker version of one deployment.
#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    /// The application's own origin; precache paths resolve against it.
    pub origin: Url,

    /// Shared namespace prefix for cache store names.
    pub cache_prefix: String,

    /// Path prefix that classifies a request as a backend data call.
    pub api_scope: String,

    /// Path of the application shell served to offline navigations.
    pub shell_path: String,

    /// Build-time precache manifest.
    pub precache_paths: Vec<String>,
}

impl WorkerPolicy {
    /// Derive the policy from the application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            origin: Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?,
            cache_prefix: config.cache_prefix.clone(),
            api_scope: config.api_scope.clone(),
            shell_path: config.shell_path.clone(),
            precache_paths: config.precache_paths.clone(),
        })
    }
}

/// One worker instance, bound to a single version and its static generation.
///
/// Lifecycle methods live in [`crate::lifecycle`], fetch routing in
/// [`crate::router`], and event dispatch in [`crate::events`]; this type
/// only owns the shared state they operate on.
pub struct WorkerContext {
    id: WorkerId,
    version: String,
    state: RwLock<WorkerState>,
    install_error: RwLock<Option<String>>,
    pub(crate) db: CacheDb,
    pub(crate) net: Arc<dyn Network>,
    pub(crate) names: CacheNames,
    pub(crate) policy: WorkerPolicy,
    pub(crate) clients: Arc<Clients>,
    pub(crate) sync: Arc<SyncRegistry>,
}

impl WorkerContext {
    /// Create a worker for `version`.
    ///
    /// The context starts in [`WorkerState::Parsed`]; nothing touches the
    /// network or the database until an install event is dispatched.
    pub fn new(
        version: &str, db: CacheDb, net: Arc<dyn Network>, policy: WorkerPolicy, clients: Arc<Clients>,
        sync: Arc<SyncRegistry>,
    ) -> Self {
        Self {
            id: WorkerId::next(),
            version: version.to_string(),
            state: RwLock::new(WorkerState::Parsed),
            install_error: RwLock::new(None),
            db,
            net,
            names: CacheNames::new(&policy.cache_prefix, version),
            policy,
            clients,
            sync,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Store names this worker addresses.
    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Why the install attempt died, if it did.
    pub async fn install_error(&self) -> Option<String> {
        self.install_error.read().await.clone()
    }

    pub(crate) async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::debug!(worker = self.id.raw(), version = %self.version, from = ?*state, to = ?next, "state change");
        *state = next;
    }

    pub(crate) async fn record_install_error(&self, message: String) {
        *self.install_error.write().await = Some(message);
    }
}
