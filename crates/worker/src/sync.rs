//! Background sync hooks.
//!
//! Collaborators register interest in a named tag (e.g. replaying offline-
//! queued expense mutations); when the platform signals connectivity
//! restoration for a due tag, the registered routine runs once. Retry and
//! backoff belong to the handler's owner and the platform's re-delivery —
//! this layer only guarantees the hook fires and a failure can't take the
//! worker down.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use coinstash_core::Error;
use tokio::sync::Mutex;

type BoxedSyncFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;
type SyncHandler = Arc<dyn Fn() -> BoxedSyncFuture + Send + Sync>;

/// Registry of sync tags and their handlers.
#[derive(Default)]
pub struct SyncRegistry {
    handlers: Mutex<HashMap<String, SyncHandler>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a sync tag, replacing any prior handler.
    pub async fn register<F, Fut>(&self, tag: &str, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let handler: SyncHandler = Arc::new(move || Box::pin(handler()));
        self.handlers.lock().await.insert(tag.to_string(), handler);
    }

    pub async fn registered(&self, tag: &str) -> bool {
        self.handlers.lock().await.contains_key(tag)
    }

    /// Fire a sync tag once.
    ///
    /// Handler failure is caught and logged, never escalated. Signals for
    /// unregistered tags are ignored.
    pub async fn fire(&self, tag: &str) {
        let handler = self.handlers.lock().await.get(tag).cloned();
        match handler {
            Some(handler) => {
                tracing::debug!(tag, "background sync firing");
                if let Err(err) = handler().await {
                    tracing::warn!(tag, error = %err, "background sync failed");
                }
            }
            None => tracing::debug!(tag, "sync signal for unregistered tag ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fire_invokes_handler() {
        let registry = SyncRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        registry
            .register("sync-expenses", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        registry.fire("sync-expenses").await;
        registry.fire("sync-expenses").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_failure_is_swallowed() {
        let registry = SyncRegistry::new();
        registry
            .register("sync-expenses", || async { Err(Error::Network("still offline".into())) })
            .await;

        // Must not panic or propagate.
        registry.fire("sync-expenses").await;
    }

    #[tokio::test]
    async fn test_unknown_tag_ignored() {
        let registry = SyncRegistry::new();
        registry.fire("sync-unknown").await;
    }

    #[tokio::test]
    async fn test_register_replaces_handler() {
        let registry = SyncRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        registry.register("sync-expenses", || async { Ok(()) }).await;
        let counter = calls.clone();
        registry
            .register("sync-expenses", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        registry.fire("sync-expenses").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.registered("sync-expenses").await);
    }
}
