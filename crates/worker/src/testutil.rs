//! Shared test support: a scripted in-memory network and context builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coinstash_core::{CacheDb, Error};
use reqwest::StatusCode;
use url::Url;

use crate::messaging::Clients;
use crate::net::{FetchOptions, Network};
use crate::request::WorkerRequest;
use crate::response::{ResponseSource, WorkerResponse};
use crate::sync::SyncRegistry;
use crate::worker::{WorkerContext, WorkerPolicy};

pub(crate) const SHELL_BODY: &[u8] = b"<html>coinstash shell</html>";

#[derive(Clone)]
struct FakeRoute {
    status: StatusCode,
    body: Vec<u8>,
    opaque: bool,
}

/// Scripted network: URL -> canned response, with an offline switch and
/// per-URL attempt counters.
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, FakeRoute>>,
    offline: AtomicBool,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeNetwork {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            hits: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn route(&self, url: &str, status: u16, body: &[u8]) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            FakeRoute {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_vec(),
                opaque: false,
            },
        );
    }

    /// Register a route whose response reads as cross-origin opaque.
    pub(crate) fn route_opaque(&self, url: &str, body: &[u8]) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            FakeRoute { status: StatusCode::OK, body: body.to_vec(), opaque: true },
        );
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Network attempts made for one URL, connectivity or not.
    pub(crate) fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &WorkerRequest, _options: &FetchOptions) -> Result<WorkerResponse, Error> {
        let url = request.url().as_str().to_string();
        *self.hits.lock().unwrap().entry(url.clone()).or_insert(0) += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".to_string()));
        }

        let route = self.routes.lock().unwrap().get(&url).cloned();
        let Some(route) = route else {
            return Ok(WorkerResponse::new(StatusCode::NOT_FOUND, vec![], vec![], ResponseSource::Network));
        };

        let response = WorkerResponse::new(
            route.status,
            vec![("content-type".to_string(), "application/octet-stream".to_string())],
            route.body,
            ResponseSource::Network,
        );
        if route.opaque {
            return Ok(response.into_opaque());
        }
        Ok(response)
    }
}

/// Policy pointing at the conventional test origin with a two-entry
/// precache manifest.
pub(crate) fn policy() -> WorkerPolicy {
    WorkerPolicy {
        origin: Url::parse("http://localhost:3000").unwrap(),
        cache_prefix: "coinstash".to_string(),
        api_scope: "/api/".to_string(),
        shell_path: "/".to_string(),
        precache_paths: vec!["/".to_string(), "/static/js/bundle.js".to_string()],
    }
}

/// Script responses for every path in [`policy`]'s precache manifest.
pub(crate) fn seed_shell(net: &FakeNetwork) {
    net.route("http://localhost:3000/", 200, SHELL_BODY);
    net.route("http://localhost:3000/static/js/bundle.js", 200, b"console.log('coinstash')");
}

pub(crate) async fn context(version: &str, net: Arc<FakeNetwork>) -> WorkerContext {
    let db = CacheDb::open_in_memory().await.unwrap();
    context_with_db(version, net, db).await
}

pub(crate) async fn context_with_db(version: &str, net: Arc<FakeNetwork>, db: CacheDb) -> WorkerContext {
    WorkerContext::new(
        version,
        db,
        net,
        policy(),
        Arc::new(Clients::new()),
        Arc::new(SyncRegistry::new()),
    )
}

pub(crate) async fn context_with_policy(version: &str, net: Arc<FakeNetwork>, policy: WorkerPolicy) -> WorkerContext {
    let db = CacheDb::open_in_memory().await.unwrap();
    WorkerContext::new(
        version,
        db,
        net,
        policy,
        Arc::new(Clients::new()),
        Arc::new(SyncRegistry::new()),
    )
}
