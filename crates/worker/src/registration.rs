//! The foreground registration host.
//!
//! The host is the worker's collaborator on the application side: it
//! registers a worker version at startup, parks a newly installed version in
//! the waiting slot while an older one is active, tells connected clients an
//! update is ready, relays the SKIP_WAITING control message, and routes
//! intercepted fetches to whichever worker currently controls the pages.
//!
//! How often to check for a new version is deliberately not decided here;
//! callers poll [`WorkerHost::check_for_update`] on whatever cadence suits
//! them.

use std::sync::Arc;

use coinstash_core::{AppConfig, CacheDb, Error};
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::events::{EventOutcome, WorkerEvent};
use crate::lifecycle::WorkerState;
use crate::messaging::{ClientId, ClientNotice, Clients};
use crate::net::{FetchOptions, Network};
use crate::request::WorkerRequest;
use crate::response::WorkerResponse;
use crate::sync::SyncRegistry;
use crate::worker::{WorkerContext, WorkerPolicy};

/// The three registration slots, at most one worker each.
#[derive(Default)]
struct Registration {
    installing: Option<Arc<WorkerContext>>,
    waiting: Option<Arc<WorkerContext>>,
    active: Option<Arc<WorkerContext>>,
}

/// Foreground-side registration and routing for one deployment.
pub struct WorkerHost {
    db: CacheDb,
    net: Arc<dyn Network>,
    policy: WorkerPolicy,
    clients: Arc<Clients>,
    sync: Arc<SyncRegistry>,
    registration: RwLock<Registration>,
}

impl WorkerHost {
    /// Create a host from the application configuration.
    pub fn new(db: CacheDb, net: Arc<dyn Network>, config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::with_policy(db, net, WorkerPolicy::from_config(config)?))
    }

    /// Create a host with an explicit policy.
    pub fn with_policy(db: CacheDb, net: Arc<dyn Network>, policy: WorkerPolicy) -> Self {
        Self {
            db,
            net,
            policy,
            clients: Arc::new(Clients::new()),
            sync: Arc::new(SyncRegistry::new()),
            registration: RwLock::new(Registration::default()),
        }
    }

    /// The shared sync registry; collaborators register replay routines here.
    pub fn sync(&self) -> &Arc<SyncRegistry> {
        &self.sync
    }

    /// Connect a foreground client; lifecycle notices arrive on the receiver.
    pub async fn connect_client(&self) -> (ClientId, UnboundedReceiver<ClientNotice>) {
        self.clients.connect().await
    }

    /// Register a worker version (application startup or update adoption).
    ///
    /// A version already active or waiting is a no-op. A fresh version
    /// installs; on success it is promoted immediately when nothing is
    /// active yet, otherwise it parks in the waiting slot and clients are
    /// told an update is ready. A failed install leaves the previous
    /// version serving.
    pub async fn register(&self, version: &str) -> Result<(), Error> {
        {
            let reg = self.registration.read().await;
            if let Some(active) = &reg.active
                && active.version() == version
            {
                return Ok(());
            }
            if let Some(waiting) = &reg.waiting
                && waiting.version() == version
            {
                return Ok(());
            }
        }

        let worker = Arc::new(WorkerContext::new(
            version,
            self.db.clone(),
            self.net.clone(),
            self.policy.clone(),
            self.clients.clone(),
            self.sync.clone(),
        ));

        {
            let mut reg = self.registration.write().await;
            // A still-newer update replaces an unfinished install.
            if let Some(old) = reg.installing.take() {
                old.set_state(WorkerState::Redundant).await;
            }
            reg.installing = Some(worker.clone());
        }

        tracing::info!(version, "installing worker");
        if let Err(err) = worker.dispatch(WorkerEvent::Install).await {
            let mut reg = self.registration.write().await;
            if reg.installing.as_ref().is_some_and(|w| w.id() == worker.id()) {
                reg.installing = None;
            }
            return Err(err);
        }

        let mut reg = self.registration.write().await;
        if !reg.installing.as_ref().is_some_and(|w| w.id() == worker.id()) {
            // Superseded mid-install; the newer registration owns the slots.
            return Ok(());
        }
        reg.installing = None;

        if reg.active.is_none() {
            self.promote(&mut reg, worker).await
        } else {
            tracing::info!(version, "worker parked waiting; prior version still controls clients");
            reg.waiting = Some(worker);
            self.clients
                .broadcast(ClientNotice::UpdateReady { version: version.to_string() })
                .await;
            Ok(())
        }
    }

    /// Poll hook for update checks; cadence belongs to the caller.
    pub async fn check_for_update(&self, version: &str) -> Result<(), Error> {
        self.register(version).await
    }

    /// Deliver a foreground message to the worker (waiting first, then
    /// active). A SKIP_WAITING request promotes the waiting worker.
    pub async fn post_message(&self, message: serde_json::Value) -> Result<(), Error> {
        let target = {
            let reg = self.registration.read().await;
            reg.waiting.clone().or_else(|| reg.active.clone())
        };
        let Some(worker) = target else {
            return Ok(());
        };

        match worker.dispatch(WorkerEvent::Message(message)).await? {
            EventOutcome::SkipWaitingRequested => self.skip_waiting().await,
            _ => Ok(()),
        }
    }

    /// Promote the waiting worker immediately. No-op without one.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        let mut reg = self.registration.write().await;
        let Some(worker) = reg.waiting.take() else {
            return Ok(());
        };
        self.promote(&mut reg, worker).await
    }

    async fn promote(&self, reg: &mut Registration, worker: Arc<WorkerContext>) -> Result<(), Error> {
        worker.dispatch(WorkerEvent::Activate).await?;
        if let Some(old) = reg.active.replace(worker) {
            old.set_state(WorkerState::Redundant).await;
        }
        Ok(())
    }

    /// The currently controlling worker, if any.
    pub async fn active(&self) -> Option<Arc<WorkerContext>> {
        self.registration.read().await.active.clone()
    }

    pub async fn active_version(&self) -> Option<String> {
        self.registration
            .read()
            .await
            .active
            .as_ref()
            .map(|w| w.version().to_string())
    }

    pub async fn waiting_version(&self) -> Option<String> {
        self.registration
            .read()
            .await
            .waiting
            .as_ref()
            .map(|w| w.version().to_string())
    }

    /// Route a fetch from a controlled page through the active worker.
    ///
    /// Uncontrolled pages (no active worker yet) go straight to the network.
    pub async fn handle_fetch(&self, request: WorkerRequest) -> Result<WorkerResponse, Error> {
        match self.active().await {
            Some(worker) => match worker.dispatch(WorkerEvent::Fetch(request)).await? {
                EventOutcome::Response(response) => Ok(response),
                outcome => Err(Error::InvalidState(format!("fetch dispatch yielded {outcome:?}"))),
            },
            None => self.net.fetch(&request, &FetchOptions::default()).await,
        }
    }

    /// Deliver a platform sync signal to the active worker.
    pub async fn fire_sync(&self, tag: &str) -> Result<(), Error> {
        if let Some(worker) = self.active().await {
            worker.dispatch(WorkerEvent::Sync { tag: tag.to_string() }).await?;
        }
        Ok(())
    }
}
