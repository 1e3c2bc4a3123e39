//! Cache store naming convention.
//!
//! Store names carry the shared namespace prefix and the deploy version:
//! `{prefix}-{version}` for a static generation, `{prefix}-api` for the
//! reserved API-response store. The same convention doubles as the eviction
//! filter at activate time.

/// Resolved store names for one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    prefix: String,
    static_store: String,
    api_store: String,
}

impl CacheNames {
    /// Resolve store names for a namespace prefix and version token.
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            prefix: format!("{prefix}-"),
            static_store: format!("{prefix}-{version}"),
            api_store: format!("{prefix}-api"),
        }
    }

    /// Name of the static generation addressed for new writes.
    pub fn static_store(&self) -> &str {
        &self.static_store
    }

    /// Name of the reserved API-response store.
    ///
    /// Unversioned: offline API data must survive version bumps, so this
    /// store is never a candidate for generation eviction.
    pub fn api_store(&self) -> &str {
        &self.api_store
    }

    /// Whether a store name falls inside this worker's namespace.
    pub fn owns(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }

    /// Eviction predicate applied at activate time.
    ///
    /// A store is evictable iff it carries the shared prefix but is neither
    /// the current static generation nor the reserved API store. Stores
    /// outside the namespace are never touched.
    pub fn is_evictable(&self, name: &str) -> bool {
        self.owns(name) && name != self.static_store && name != self.api_store
    }
}
