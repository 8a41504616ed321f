//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (NOVELSA_OFFLINE_*)
//! 2. TOML config file (if NOVELSA_OFFLINE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (NOVELSA_OFFLINE_*)
/// 2. TOML config file (if NOVELSA_OFFLINE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the application is served from.
    ///
    /// Requests to any other origin are handled by the external strategy.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix of the upstream REST API.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Interception layer version, used to name cache generations.
    #[serde(default = "default_version")]
    pub version: String,

    /// Path to the structured offline store (SQLite).
    ///
    /// Set via NOVELSA_OFFLINE_STORE_PATH environment variable.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Path to the named response caches (SQLite).
    ///
    /// Set via NOVELSA_OFFLINE_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Shell assets fetched and cached on install.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Path patterns (regular expressions) of navigations that may be
    /// served from the shell cache while offline.
    #[serde(default = "default_offline_routes")]
    pub offline_routes: Vec<String>,

    /// How long an API request may wait on the network before falling back.
    #[serde(default = "default_api_timeout_ms")]
    pub api_timeout_ms: u64,

    /// Overall HTTP client timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Storage quota reported by `storage_info`.
    #[serde(default = "default_storage_quota_bytes")]
    pub storage_quota_bytes: u64,

    /// Default age threshold for the cleanup sweep.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u32,

    /// Whether a freshly installed worker activates without waiting.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_api_prefix() -> String {
    "/api".into()
}

fn default_version() -> String {
    "v2.0.0".into()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./novelsa-offline.sqlite")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./novelsa-caches.sqlite")
}

fn default_shell_assets() -> Vec<String> {
    ["/", "/index.html", "/styles.css", "/main.js", "/offline.html"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_routes() -> Vec<String> {
    [
        r"^/offline-library",
        r"^/offline$",
        r"^/offline-reader/[^/]+$",
        r"^/offline-novel/[^/]+$",
        r"^/offline-favorites",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_timeout_ms() -> u64 {
    5_000
}

fn default_fetch_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "novelsa-offline/0.1".into()
}

fn default_storage_quota_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_cleanup_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_prefix: default_api_prefix(),
            version: default_version(),
            store_path: default_store_path(),
            cache_path: default_cache_path(),
            shell_assets: default_shell_assets(),
            offline_routes: default_offline_routes(),
            api_timeout_ms: default_api_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            user_agent: default_user_agent(),
            storage_quota_bytes: default_storage_quota_bytes(),
            cleanup_days: default_cleanup_days(),
            skip_waiting: true,
        }
    }
}

impl AppConfig {
    /// API race timeout as Duration.
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// HTTP client timeout as Duration for use with reqwest.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme {scheme}") }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `NOVELSA_OFFLINE_`
    /// 2. TOML file from `NOVELSA_OFFLINE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("NOVELSA_OFFLINE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("NOVELSA_OFFLINE_")
                .ignore(&["CONFIG_FILE"])
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
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.version, "v2.0.0");
        assert_eq!(config.store_path, PathBuf::from("./novelsa-offline.sqlite"));
        assert_eq!(config.shell_assets.len(), 5);
        assert_eq!(config.offline_routes.len(), 5);
        assert_eq!(config.api_timeout_ms, 5_000);
        assert_eq!(config.cleanup_days, 30);
        assert!(config.skip_waiting);
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().host_str(), Some("localhost"));

        let config = AppConfig { origin: "ftp://files.example.com".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "offline.toml",
                r#"
                version = "v3.0.0"
                api_timeout_ms = 2500
                "#,
            )?;
            jail.set_env("NOVELSA_OFFLINE_CONFIG_FILE", "offline.toml");
            jail.set_env("NOVELSA_OFFLINE_API_TIMEOUT_MS", "1500");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.version, "v3.0.0");
            assert_eq!(config.api_timeout_ms, 1500);
            assert_eq!(config.api_prefix, "/api");
            Ok(())
        });
    }
}
