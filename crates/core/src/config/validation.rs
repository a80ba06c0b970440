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
    /// Returns `ConfigError::Invalid` if:
    /// - `max_workers` is 0 or exceeds 64
    /// - `cache_size` is 0
    /// - `request_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `relay_chunk_size` is outside 512 bytes..=1MB
    /// - `user_agent` is empty
    /// - `base_url` is not an absolute http(s) URL
    ///
    /// Returns `ConfigError::Missing` if `use_proxy` is set without `proxy_url`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid { field: "max_workers".into(), reason: "must be greater than 0".into() });
        }
        if self.max_workers > 64 {
            return Err(ConfigError::Invalid { field: "max_workers".into(), reason: "must not exceed 64".into() });
        }

        if self.cache_size == 0 {
            return Err(ConfigError::Invalid { field: "cache_size".into(), reason: "must be greater than 0".into() });
        }

        if self.request_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.request_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if !(512..=1024 * 1024).contains(&self.relay_chunk_size) {
            return Err(ConfigError::Invalid {
                field: "relay_chunk_size".into(),
                reason: "must be between 512 bytes and 1MB".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        match url::Url::parse(&self.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(ConfigError::Invalid {
                    field: "base_url".into(),
                    reason: format!("unsupported scheme: {}", u.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "base_url".into(), reason: e.to_string() }),
        }

        if self.use_proxy && self.proxy_url.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Missing {
                field: "proxy_url".into(),
                hint: "Set VIDRELAY_PROXY_URL or disable VIDRELAY_USE_PROXY".into(),
            });
        }

        if self.reaper_interval_secs == 0 {
            tracing::warn!("reaper_interval_secs is 0; admission table will only shrink on overflow eviction");
        }

        Ok(())
    }
}
