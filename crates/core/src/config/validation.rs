//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

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
    /// Returns `ConfigError::Missing` if `origin` or `version` is empty.
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `api_prefix` or a shell asset does not start with `/`
    /// - `user_agent` is empty
    /// - an offline route is not a valid regular expression
    /// - `api_timeout_ms` is outside 100ms..=60s or `fetch_timeout_ms` outside 100ms..=5min
    /// - `storage_quota_bytes` or `cleanup_days` is 0
    /// - `store_path` and `cache_path` point to the same file
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.origin.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "origin".into(),
                hint: "set NOVELSA_OFFLINE_ORIGIN to the app's base URL".into(),
            });
        }
        self.origin_url()?;

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid { field: "api_prefix".into(), reason: "must start with '/'".into() });
        }

        if self.version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "version".into(),
                hint: "set NOVELSA_OFFLINE_VERSION to name the cache generation".into(),
            });
        }

        if let Some(asset) = self.shell_assets.iter().find(|a| !a.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "shell_assets".into(),
                reason: format!("'{asset}' must be an absolute path"),
            });
        }

        for pattern in &self.offline_routes {
            regex::Regex::new(pattern).map_err(|e| ConfigError::Invalid {
                field: "offline_routes".into(),
                reason: format!("'{pattern}': {e}"),
            })?;
        }

        if self.api_timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "api_timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.api_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "api_timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.fetch_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.fetch_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.storage_quota_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "storage_quota_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.cleanup_days == 0 {
            return Err(ConfigError::Invalid { field: "cleanup_days".into(), reason: "must be at least 1".into() });
        }

        if self.store_path == self.cache_path {
            return Err(ConfigError::Invalid {
                field: "cache_path".into(),
                reason: "must differ from store_path".into(),
            });
        }

        if self.api_timeout_ms > self.fetch_timeout_ms {
            tracing::warn!(
                api_timeout_ms = self.api_timeout_ms,
                fetch_timeout_ms = self.fetch_timeout_ms,
                "api_timeout_ms exceeds fetch_timeout_ms; \
                 the client timeout will fire first"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_missing_required() {
        let config = AppConfig { origin: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "origin"));

        let config = AppConfig { version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "version"));
    }

    #[test]
    fn test_validate_relative_api_prefix() {
        let config = AppConfig { api_prefix: "api".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_prefix"));
    }

    #[test]
    fn test_validate_relative_shell_asset() {
        let config = AppConfig { shell_assets: vec!["main.js".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "shell_assets"));
    }

    #[test]
    fn test_validate_bad_offline_route() {
        let config = AppConfig { offline_routes: vec!["^/offline(".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "offline_routes"));
    }

    #[test]
    fn test_validate_api_timeout_bounds() {
        let config = AppConfig { api_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_timeout_ms"));

        let config = AppConfig { api_timeout_ms: 60_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_timeout_ms"));
    }

    #[test]
    fn test_validate_same_paths() {
        let config = AppConfig { cache_path: AppConfig::default().store_path, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_path"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { api_timeout_ms: 100, fetch_timeout_ms: 100, cleanup_days: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
