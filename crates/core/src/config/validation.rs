//! Configuration validation rules.
//!
//! Validation logic for `AppConfig` values after they have been loaded
//! from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `cache_version` is empty or contains whitespace
    /// - `cache_version` is the reserved "api" suffix
    /// - `api_scope` or `shell_path` is not an absolute path
    /// - `timeout_ms` is outside [100, 300000]
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.is_empty() || self.cache_prefix.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_prefix".into(),
                reason: "must be non-empty without whitespace".into(),
            });
        }

        if self.cache_version.is_empty() || self.cache_version.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must be non-empty without whitespace".into(),
            });
        }
        // "{prefix}-api" is the reserved API store name; a version token of
        // "api" would alias the static generation onto it.
        if self.cache_version == "api" {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "\"api\" is reserved for the API-response store".into(),
            });
        }

        if !self.api_scope.starts_with('/') {
            return Err(ConfigError::Invalid { field: "api_scope".into(), reason: "must be an absolute path".into() });
        }
        if !self.shell_path.starts_with('/') {
            return Err(ConfigError::Invalid { field: "shell_path".into(), reason: "must be an absolute path".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.precache_paths.contains(&self.shell_path) {
            tracing::warn!(
                shell_path = %self.shell_path,
                "shell_path is not in precache_paths; \
                 offline navigations will have no shell to fall back to"
            );
        }

        Ok(())
    }
}
