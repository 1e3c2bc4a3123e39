//! Request-identity key generation.
//!
//! A cache entry is addressed by the identity of the request that produced
//! it: the method plus the canonical URL. Only retrieval requests are ever
//! cached, but the method participates in the key so the invariant holds
//! structurally, not just by convention.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request identity.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = request_key("GET", "https://example.com/app.js");
        let key2 = request_key("GET", "https://example.com/app.js");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_url() {
        let key1 = request_key("GET", "https://example.com/a.js");
        let key2 = request_key("GET", "https://example.com/b.js");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_key_different_method() {
        let get = request_key("GET", "https://example.com/api/expenses");
        let head = request_key("HEAD", "https://example.com/api/expenses");
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
