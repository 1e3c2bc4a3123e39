//! Network transport behind the worker.
//!
//! The [`Network`] trait is the seam between the strategies and the actual
//! transport, so tests (and embedders with their own stacks) can swap it
//! out. [`HttpNetwork`] is the real implementation over reqwest.
//!
//! Transport failures (connectivity loss, timeout, DNS) surface as
//! [`Error::Network`]; HTTP error statuses come back as ordinary responses —
//! the strategies decide what an error status means, the transport does not.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use coinstash_core::{AppConfig, Error};
use reqwest::{Client, header};
use url::Url;

use crate::request::WorkerRequest;
use crate::response::{ResponseSource, WorkerResponse};

/// Per-fetch options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Force a fresh fetch past any intermediate HTTP cache.
    ///
    /// Install-time precaching sets this so the manifest resources can't be
    /// satisfied by a stale intermediary copy.
    pub bypass_http_cache: bool,
}

impl FetchOptions {
    /// Options for a cache-bypassing fetch.
    pub fn fresh() -> Self {
        Self { bypass_http_cache: true }
    }
}

/// Pluggable transport used by the worker.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the fetch, buffering the body.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` only for transport-level failure. A response
    /// with any HTTP status is a success at this layer.
    async fn fetch(&self, request: &WorkerRequest, options: &FetchOptions) -> Result<WorkerResponse, Error>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// User agent string (default: "coinstash-worker/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            user_agent: "coinstash-worker/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl NetConfig {
    /// Derive transport settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP transport over reqwest.
pub struct HttpNetwork {
    http: Client,
    config: NetConfig,
    origin: Url,
}

impl HttpNetwork {
    /// Create a new HTTP transport.
    ///
    /// `origin` is the application's own origin; responses that end up on a
    /// different origin (cross-origin redirects) are marked opaque and will
    /// never be persisted.
    pub fn new(origin: Url, config: NetConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, origin })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &WorkerRequest, options: &FetchOptions) -> Result<WorkerResponse, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method().clone(), request.url().as_str());
        if options.bypass_http_cache {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("fetch failed: {}", e)))?;

        let status = response.status();
        let final_url = response.url().clone();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::Network(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::Network(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url(),
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        let response = WorkerResponse::new(status, headers, bytes, ResponseSource::Network);
        if final_url.origin() != self.origin.origin() {
            return Ok(response.into_opaque());
        }
        Ok(response)
    }
}
