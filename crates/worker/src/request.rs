//! Intercepted-request model and URL canonicalization.

use coinstash_core::Error;
use coinstash_core::cache::key::request_key;
use reqwest::Method;
use url::Url;

/// How the request reached the worker.
///
/// Navigations get the application-shell fallback when the network is down;
/// subresource requests do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Everything else: scripts, styles, images, API calls.
    #[default]
    Subresource,
}

/// An outgoing request intercepted from a controlled page.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    method: Method,
    url: Url,
    mode: RequestMode,
}

impl WorkerRequest {
    /// Build a request from an absolute URL.
    pub fn new(method: Method, url: &str, mode: RequestMode) -> Result<Self, Error> {
        Ok(Self { method, url: canonicalize(url)?, mode })
    }

    /// A plain GET subresource request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new(Method::GET, url, RequestMode::Subresource)
    }

    /// A top-level navigation request.
    pub fn navigate(url: &str) -> Result<Self, Error> {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Only retrieval requests are ever cached or served from cache.
    pub fn is_retrieval(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Identity key addressing this request's cache entry.
    pub fn key(&self) -> String {
        request_key(self.method.as_str(), self.url.as_str())
    }
}

/// Canonicalize a request URL for consistent cache keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an absolute http(s) URL (the host lowercases during parsing)
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("http://localhost:3000/app.js").unwrap();
        assert_eq!(url.path(), "/app.js");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/a").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("http://localhost:3000/dashboard#goals").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("http://localhost:3000/api/expenses?month=3").unwrap();
        assert_eq!(url.query(), Some("month=3"));
    }

    #[test]
    fn test_canonicalize_rejects_relative() {
        assert!(canonicalize("/api/expenses").is_err());
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = WorkerRequest::get("http://localhost:3000/#top").unwrap();
        let b = WorkerRequest::get("http://localhost:3000/").unwrap();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_retrieval_detection() {
        let get = WorkerRequest::get("http://localhost:3000/api/expenses").unwrap();
        assert!(get.is_retrieval());

        let post = WorkerRequest::new(Method::POST, "http://localhost:3000/api/expenses", RequestMode::Subresource).unwrap();
        assert!(!post.is_retrieval());
    }

    #[test]
    fn test_navigation_mode() {
        let nav = WorkerRequest::navigate("http://localhost:3000/dashboard").unwrap();
        assert!(nav.is_navigation());
        assert!(nav.is_retrieval());
    }
}
