//! The two caching strategies behind the router.
//!
//! Both strategies treat a cache write failure (quota, storage error) as
//! non-fatal: the live response still goes back to the caller and the
//! failure is logged, never retried.

use coinstash_core::Error;

use crate::net::FetchOptions;
use crate::request::WorkerRequest;
use crate::response::WorkerResponse;
use crate::worker::WorkerContext;

/// Network-First: always try the network, fall back to the last snapshot.
///
/// On success the response is duplicated and the copy replaces any prior
/// entry for this request identity in the API store. On transport failure
/// the stored snapshot is served; with no snapshot, the synthesized offline
/// 503 goes back instead — an API caller always receives a well-formed
/// response, never a raw transport error.
pub async fn network_first(worker: &WorkerContext, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
    match worker.net.fetch(request, &FetchOptions::default()).await {
        Ok(response) => {
            if response.is_cacheable() {
                let snapshot = response.duplicate();
                if let Err(err) = worker
                    .db
                    .put_entry(worker.names.api_store(), &snapshot.to_stored(request))
                    .await
                {
                    tracing::warn!(url = %request.url(), error = %err, "API write-through failed; serving live response");
                }
            }
            Ok(response)
        }
        Err(net_err) => {
            tracing::debug!(url = %request.url(), error = %net_err, "network unavailable; trying API store");
            match worker.db.get_entry(worker.names.api_store(), &request.key()).await {
                Ok(Some(entry)) => Ok(WorkerResponse::from_stored(entry)),
                Ok(None) => Ok(WorkerResponse::offline_fallback()),
                Err(err) => {
                    tracing::warn!(url = %request.url(), error = %err, "API store lookup failed");
                    Ok(WorkerResponse::offline_fallback())
                }
            }
        }
    }
}

/// Cache-First: serve from the static generation, touch the network only on
/// a miss.
///
/// Misses are fetched and written through unless the response is an error
/// or opaque (those are returned as-is, not persisted). When the network
/// itself fails, navigations fall back to the cached application shell;
/// anything else propagates the failure to the caller.
pub async fn cache_first(worker: &WorkerContext, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
    let store = worker.names.static_store();

    match worker.db.get_entry(store, &request.key()).await {
        Ok(Some(entry)) => return Ok(WorkerResponse::from_stored(entry)),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(url = %request.url(), error = %err, "static store lookup failed; treating as miss");
        }
    }

    match worker.net.fetch(request, &FetchOptions::default()).await {
        Ok(response) => {
            if !response.is_cacheable() {
                return Ok(response);
            }
            let snapshot = response.duplicate();
            if let Err(err) = worker.db.put_entry(store, &snapshot.to_stored(request)).await {
                tracing::warn!(url = %request.url(), error = %err, "static write-through failed; serving live response");
            }
            Ok(response)
        }
        Err(net_err) => {
            if request.is_navigation()
                && let Some(shell) = cached_shell(worker).await
            {
                tracing::info!(url = %request.url(), "offline navigation; serving cached shell");
                return Ok(shell);
            }
            Err(net_err)
        }
    }
}

/// Look up the cached application shell for offline navigations.
async fn cached_shell(worker: &WorkerContext) -> Option<WorkerResponse> {
    let url = worker.policy.origin.join(&worker.policy.shell_path).ok()?;
    let request = WorkerRequest::get(url.as_str()).ok()?;
    match worker.db.get_entry(worker.names.static_store(), &request.key()).await {
        Ok(entry) => entry.map(WorkerResponse::from_stored),
        Err(err) => {
            tracing::warn!(error = %err, "shell lookup failed");
            None
        }
    }
}
