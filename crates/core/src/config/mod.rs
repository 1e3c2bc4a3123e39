//! Application configuration with layered loading.
//!
//! Configuration management using figment for layered loading from
//! multiple sources:
//!
//! 1. Environment variables (COINSTASH_*)
//! 2. TOML config file (if COINSTASH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

use crate::cache::CacheNames;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (COINSTASH_*)
/// 2. TOML config file (if COINSTASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared namespace prefix for all cache stores.
    ///
    /// Set via COINSTASH_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version token of the current deploy; names the static generation.
    ///
    /// Set via COINSTASH_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to the SQLite cache database.
    ///
    /// Set via COINSTASH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the application is served from; precache paths are resolved
    /// against it and responses landing on another origin are opaque.
    ///
    /// Set via COINSTASH_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix that marks a request as a backend data call.
    ///
    /// Set via COINSTASH_API_SCOPE environment variable.
    #[serde(default = "default_api_scope")]
    pub api_scope: String,

    /// Path of the application shell served to offline navigations.
    ///
    /// Set via COINSTASH_SHELL_PATH environment variable.
    #[serde(default = "default_shell_path")]
    pub shell_path: String,

    /// Build-time precache manifest: paths written into the static
    /// generation at install.
    #[serde(default = "default_precache_paths")]
    pub precache_paths: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via COINSTASH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via COINSTASH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to buffer per response.
    ///
    /// Set via COINSTASH_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_cache_prefix() -> String {
    "coinstash".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./coinstash-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_api_scope() -> String {
    "/api/".into()
}

fn default_shell_path() -> String {
    "/".into()
}

fn default_precache_paths() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/static/js/bundle.js",
        "/static/css/main.css",
        "/manifest.json",
        "/icon.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_user_agent() -> String {
    "coinstash-worker/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            origin: default_origin(),
            api_scope: default_api_scope(),
            shell_path: default_shell_path(),
            precache_paths: default_precache_paths(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Store names resolved for the configured prefix and version.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(&self.cache_prefix, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `COINSTASH_`
    /// 2. TOML file from `COINSTASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("COINSTASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("COINSTASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_prefix, "coinstash");
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.db_path, PathBuf::from("./coinstash-cache.sqlite"));
        assert_eq!(config.api_scope, "/api/");
        assert_eq!(config.shell_path, "/");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_bytes, 5_242_880);
        assert!(config.precache_paths.contains(&"/".to_string()));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cache_names_from_config() {
        let config = AppConfig { cache_version: "v3".into(), ..Default::default() };
        let names = config.cache_names();
        assert_eq!(names.static_store(), "coinstash-v3");
        assert_eq!(names.api_store(), "coinstash-api");
    }
}
