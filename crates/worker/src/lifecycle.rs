//! Worker lifecycle: the state machine and the install/activate routines.
//!
//! A worker moves `Parsed → Installing → Installed → Activating →
//! Activated`, or drops to `Redundant` when its install fails or a newer
//! version replaces it. Install precaches the manifest into the worker's
//! static generation; activate evicts stale generations and claims every
//! connected client.

use std::sync::atomic::{AtomicU64, Ordering};

use coinstash_core::Error;
use serde::{Deserialize, Serialize};

use crate::messaging::ClientNotice;
use crate::net::FetchOptions;
use crate::request::WorkerRequest;
use crate::worker::WorkerContext;

/// Unique identifier for a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Created, nothing run yet.
    #[default]
    Parsed,
    /// Install event in flight (precache running).
    Installing,
    /// Installed; parked until promotion.
    Installed,
    /// Activate event in flight (evicting stale generations).
    Activating,
    /// Active and controlling pages.
    Activated,
    /// Install failed or a newer worker replaced this one.
    Redundant,
}

impl WorkerState {
    /// Installed-but-not-promoted, i.e. parked in the waiting slot.
    pub fn is_waiting(self) -> bool {
        self == WorkerState::Installed
    }

    pub fn is_active(self) -> bool {
        self == WorkerState::Activated
    }
}

impl WorkerContext {
    /// Run the install step: precache the manifest into this worker's
    /// static generation.
    ///
    /// Any single precache failure fails the whole install; the worker goes
    /// `Redundant` and never reaches the waiting slot, leaving whatever
    /// version is currently active in charge.
    pub(crate) async fn install(&self) -> Result<(), Error> {
        let state = self.state().await;
        if state != WorkerState::Parsed {
            return Err(Error::InvalidState(format!("install dispatched in state {state:?}")));
        }

        self.set_state(WorkerState::Installing).await;

        match self.precache().await {
            Ok(count) => {
                tracing::info!(version = %self.version(), entries = count, "precache complete");
                self.set_state(WorkerState::Installed).await;
                Ok(())
            }
            Err(err) => {
                tracing::error!(version = %self.version(), error = %err, "precache failed; install aborted");
                self.record_install_error(err.to_string()).await;
                self.set_state(WorkerState::Redundant).await;
                Err(err)
            }
        }
    }

    /// Fetch every manifest path fresh and write it into the static store.
    ///
    /// Fetches bypass any intermediate HTTP cache so a stale copy of a
    /// manifest resource can't be installed. Writes are UPSERTs, so
    /// duplicate manifest entries collapse to one entry per unique path.
    async fn precache(&self) -> Result<usize, Error> {
        let store = self.names.static_store();
        self.db.open_store(store).await?;

        for path in &self.policy.precache_paths {
            let url = self
                .policy
                .origin
                .join(path)
                .map_err(|e| Error::InvalidUrl(format!("precache path {path}: {e}")))?;
            let request = WorkerRequest::get(url.as_str())?;

            let response = self
                .net
                .fetch(&request, &FetchOptions::fresh())
                .await
                .map_err(|e| Error::InstallFailed(format!("precache {path}: {e}")))?;

            if !response.is_cacheable() {
                return Err(Error::InstallFailed(format!(
                    "precache {path}: status {}",
                    response.status().as_u16()
                )));
            }

            let snapshot = response.duplicate();
            self.db.put_entry(store, &snapshot.to_stored(&request)).await?;
        }

        Ok(self.policy.precache_paths.len())
    }

    /// Run the activate step: evict stale generations, then take control of
    /// every connected client immediately.
    ///
    /// Only stores inside this worker's namespace are candidates; the
    /// current static generation and the reserved API store survive.
    pub(crate) async fn activate(&self) -> Result<(), Error> {
        let state = self.state().await;
        if !state.is_waiting() {
            return Err(Error::InvalidState(format!("activate dispatched in state {state:?}")));
        }

        self.set_state(WorkerState::Activating).await;

        let mut deleted = 0u32;
        for name in self.db.store_names().await? {
            if self.names.is_evictable(&name) {
                tracing::debug!(store = %name, "deleting stale cache generation");
                self.db.delete_store(&name).await?;
                deleted += 1;
            }
        }
        tracing::info!(version = %self.version(), deleted, "activation cleanup complete");

        self.clients
            .broadcast(ClientNotice::ControllerChange { version: self.version().to_string() })
            .await;

        self.set_state(WorkerState::Activated).await;
        Ok(())
    }
}
