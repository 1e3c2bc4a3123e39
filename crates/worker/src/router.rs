//! Request classification and fetch routing.
//!
//! Every intercepted retrieval request is classified by path and dispatched
//! to one strategy: backend data calls get Network-First (freshness, with
//! last-known-good fallback), everything else gets Cache-First (latency and
//! offline availability for immutable build assets). That asymmetry is the
//! core policy of this layer. Mutating requests are never intercepted.

use coinstash_core::Error;

use crate::net::FetchOptions;
use crate::request::WorkerRequest;
use crate::response::WorkerResponse;
use crate::strategy;
use crate::worker::WorkerContext;

/// What the router decided to do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Backend data call: Network-First against the API store.
    Api,
    /// Static asset: Cache-First against the current static generation.
    StaticAsset,
    /// Mutating method: straight to the network, uncached.
    Passthrough,
}

/// Classify a request by method and path.
pub fn classify(request: &WorkerRequest, api_scope: &str) -> RequestClass {
    if !request.is_retrieval() {
        return RequestClass::Passthrough;
    }
    if request.url().path().starts_with(api_scope) {
        RequestClass::Api
    } else {
        RequestClass::StaticAsset
    }
}

impl WorkerContext {
    /// Serve one intercepted request through the strategy its class selects.
    pub(crate) async fn handle_fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
        match classify(request, &self.policy.api_scope) {
            RequestClass::Passthrough => self.net.fetch(request, &FetchOptions::default()).await,
            RequestClass::Api => strategy::network_first(self, request).await,
            RequestClass::StaticAsset => strategy::cache_first(self, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, FakeNetwork};
    use reqwest::Method;

    fn get(url: &str) -> WorkerRequest {
        WorkerRequest::get(url).unwrap()
    }

    #[test]
    fn test_classify_api_path() {
        let request = get("http://localhost:3000/api/expenses");
        assert_eq!(classify(&request, "/api/"), RequestClass::Api);
    }

    #[test]
    fn test_classify_static_asset() {
        let request = get("http://localhost:3000/static/js/bundle.js");
        assert_eq!(classify(&request, "/api/"), RequestClass::StaticAsset);

        let root = get("http://localhost:3000/");
        assert_eq!(classify(&root, "/api/"), RequestClass::StaticAsset);
    }

    #[test]
    fn test_classify_mutating_methods_pass_through() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let request =
                WorkerRequest::new(method, "http://localhost:3000/api/expenses", Default::default()).unwrap();
            assert_eq!(classify(&request, "/api/"), RequestClass::Passthrough);
        }
    }

    #[tokio::test]
    async fn test_mutating_request_never_cached() {
        let net = FakeNetwork::shared();
        net.route("http://localhost:3000/api/expenses", 200, br#"{"id":7}"#);
        let worker = testutil::context("v1", net).await;

        let request =
            WorkerRequest::new(Method::POST, "http://localhost:3000/api/expenses", Default::default()).unwrap();
        let response = worker.handle_fetch(&request).await.unwrap();
        assert!(response.is_ok());

        // Not in the API store, not in the static generation, under any key.
        assert_eq!(worker.db.entry_count("coinstash-api").await.unwrap(), 0);
        assert_eq!(worker.db.entry_count("coinstash-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mutating_request_failure_propagates() {
        let net = FakeNetwork::shared();
        net.set_offline(true);
        let worker = testutil::context("v1", net).await;

        let request =
            WorkerRequest::new(Method::POST, "http://localhost:3000/api/expenses", Default::default()).unwrap();
        assert!(matches!(worker.handle_fetch(&request).await, Err(Error::Network(_))));
    }
}
