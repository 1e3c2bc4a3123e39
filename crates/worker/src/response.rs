//! Response snapshots flowing between the network, the cache, and the page.
//!
//! A network response stream is read exactly once and buffered into
//! [`bytes::Bytes`]; from then on the response is an immutable snapshot and
//! [`WorkerResponse::duplicate`] hands out independent readable copies, which
//! is what lets a strategy cache one copy and return the other.

use bytes::Bytes;
use chrono::Utc;
use coinstash_core::StoredResponse;
use reqwest::StatusCode;

use crate::request::WorkerRequest;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Live from the network.
    Network,
    /// Served from a cache store.
    Cache,
    /// Built by the worker itself (offline error contract).
    Synthesized,
}

/// A buffered response snapshot.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
    opaque: bool,
    source: ResponseSource,
}

impl WorkerResponse {
    pub fn new(
        status: StatusCode, headers: Vec<(String, String)>, body: impl Into<Bytes>, source: ResponseSource,
    ) -> Self {
        Self { status, headers, body: body.into(), opaque: false, source }
    }

    /// Mark this response as opaque (content landed on a foreign origin).
    pub fn into_opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Whether this response may be persisted.
    ///
    /// Error and opaque responses never enter a cache store.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && !self.opaque
    }

    /// Produce an independent readable copy of this snapshot.
    ///
    /// One copy can be persisted while the other is returned to the caller;
    /// the shared buffer is immutable so neither can observe the other.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// The synthesized offline-error contract: status 503 with a JSON body
    /// the foreground API client matches on to distinguish "offline with no
    /// cached data" from other failures.
    pub fn offline_fallback() -> Self {
        let body = serde_json::json!({
            "error": "Offline",
            "message": "No internet connection and no cached data available",
        });
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from(body.to_string()),
            opaque: false,
            source: ResponseSource::Synthesized,
        }
    }

    /// Snapshot this response into its stored-row form for `request`.
    pub fn to_stored(&self, request: &WorkerRequest) -> StoredResponse {
        StoredResponse {
            key: request.key(),
            method: request.method().to_string(),
            url: request.url().to_string(),
            status: self.status.as_u16(),
            headers: self.headers.clone(),
            body: self.body.to_vec(),
            stored_at: Utc::now().to_rfc3339(),
        }
    }

    /// Rehydrate a stored row into a servable response.
    pub fn from_stored(entry: StoredResponse) -> Self {
        Self {
            status: StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK),
            headers: entry.headers,
            body: Bytes::from(entry.body),
            opaque: false,
            source: ResponseSource::Cache,
        }
    }
}
