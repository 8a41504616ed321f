//! Per-version settings of the interception layer.

use crate::routes::OfflineRoutes;
use novelsa_core::{AppConfig, CacheNames, ConfigError};
use std::time::Duration;
use url::Url;

/// Path the synthesized offline document is stored under.
pub const OFFLINE_PAGE_PATH: &str = "/offline.html";

/// Entry points tried, in order, for offline-capable navigations.
pub const APP_ENTRY_POINTS: [&str; 2] = ["/index.html", "/"];

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub version: String,
    pub names: CacheNames,
    pub origin: Url,
    pub api_prefix: String,
    pub shell_assets: Vec<String>,
    pub offline_routes: OfflineRoutes,
    /// Longest an API request waits on the network before falling back.
    pub api_timeout: Duration,
    /// Activate right after install instead of waiting for the old version.
    pub skip_waiting: bool,
}

impl WorkerSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let offline_routes = OfflineRoutes::new(&config.offline_routes)
            .map_err(|e| ConfigError::Invalid { field: "offline_routes".into(), reason: e.to_string() })?;

        Ok(Self {
            version: config.version.clone(),
            names: CacheNames::for_version(&config.version),
            origin: config.origin_url()?,
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
            shell_assets: config.shell_assets.clone(),
            offline_routes,
            api_timeout: config.api_timeout(),
            skip_waiting: config.skip_waiting,
        })
    }

    /// Same settings under another version; cache names follow the version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self.names = CacheNames::for_version(version);
        self
    }

    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Absolute URL of an origin-relative path.
    pub fn url_for(&self, path: &str) -> Option<Url> {
        self.origin.join(path).ok()
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        novelsa_client::fetch::is_same_origin(&self.origin, url)
    }

    /// Whether `path` is the API prefix or below it.
    pub fn is_api_path(&self, path: &str) -> bool {
        path.strip_prefix(&self.api_prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let settings = WorkerSettings::from_config(&AppConfig::default()).unwrap();
        assert_eq!(settings.names.shell, "shell-v2.0.0");
        assert_eq!(settings.api_timeout, Duration::from_secs(5));
        assert!(settings.offline_routes.is_offline_capable("/offline-library"));
        assert_eq!(settings.url_for(OFFLINE_PAGE_PATH).unwrap().as_str(), "http://localhost:3000/offline.html");
    }

    #[test]
    fn test_with_version_renames_caches() {
        let settings = WorkerSettings::from_config(&AppConfig::default()).unwrap().with_version("v3");
        assert_eq!(settings.version, "v3");
        assert_eq!(settings.names.api, "api-v3");
    }

    #[test]
    fn test_is_api_path() {
        let settings = WorkerSettings::from_config(&AppConfig::default()).unwrap();
        assert!(settings.is_api_path("/api"));
        assert!(settings.is_api_path("/api/novels/n1"));
        assert!(!settings.is_api_path("/apical"));
        assert!(!settings.is_api_path("/offline"));
    }

    #[test]
    fn test_invalid_route_pattern() {
        let config = AppConfig { offline_routes: vec!["(".into()], ..AppConfig::default() };
        assert!(matches!(WorkerSettings::from_config(&config), Err(ConfigError::Invalid { .. })));
    }
}
