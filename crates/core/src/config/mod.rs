//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (VIDRELAY_*)
//! 2. TOML config file (if VIDRELAY_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Configuration is read once at process start and never mutated afterwards.

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Extra time a resolve caller waits beyond the fetch timeout, so the fetch
/// can finish or fail on its own before the caller gives up.
pub const RESOLVE_WAIT_SLACK: Duration = Duration::from_secs(2);

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (VIDRELAY_*)
/// 2. TOML config file (if VIDRELAY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the listing and search pages are fetched from.
    ///
    /// Set via VIDRELAY_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Route upstream traffic through a forward proxy.
    ///
    /// Set via VIDRELAY_USE_PROXY environment variable.
    #[serde(default)]
    pub use_proxy: bool,

    /// Forward proxy address, e.g. `http://10.0.0.2:8887`.
    ///
    /// Set via VIDRELAY_PROXY_URL environment variable.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Resolver worker slots; also the admission table bound.
    ///
    /// Set via VIDRELAY_MAX_WORKERS environment variable.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Number of fetched documents kept in memory.
    ///
    /// Set via VIDRELAY_CACHE_SIZE environment variable.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via VIDRELAY_REQUEST_TIMEOUT_MS environment variable.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Seconds between admission table sweeps.
    ///
    /// Set via VIDRELAY_REAPER_INTERVAL_SECS environment variable.
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Maximum bytes forwarded per relay frame.
    ///
    /// Set via VIDRELAY_RELAY_CHUNK_SIZE environment variable.
    #[serde(default = "default_relay_chunk_size")]
    pub relay_chunk_size: usize,

    /// User-Agent presented to the origin.
    ///
    /// Set via VIDRELAY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Listen address for the HTTP server.
    ///
    /// Set via VIDRELAY_BIND environment variable.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Verbose logging.
    ///
    /// Set via VIDRELAY_DEBUG_MODE environment variable.
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_base_url() -> String {
    "https://rule34video.com".into()
}

fn default_max_workers() -> usize {
    2
}

fn default_cache_size() -> usize {
    128
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_reaper_interval_secs() -> u64 {
    300
}

fn default_relay_chunk_size() -> usize {
    8 * 1024
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .into()
}

fn default_bind() -> String {
    "0.0.0.0:5001".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            use_proxy: false,
            proxy_url: None,
            max_workers: default_max_workers(),
            cache_size: default_cache_size(),
            request_timeout_ms: default_request_timeout_ms(),
            reaper_interval_secs: default_reaper_interval_secs(),
            relay_chunk_size: default_relay_chunk_size(),
            user_agent: default_user_agent(),
            bind: default_bind(),
            debug_mode: false,
        }
    }
}

impl AppConfig {
    /// Upstream timeout as Duration for use with reqwest/tokio.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// How long a resolve caller blocks before falling back to the empty result.
    pub fn resolve_wait(&self) -> Duration {
        self.request_timeout() + RESOLVE_WAIT_SLACK
    }

    /// Interval between reaper sweeps.
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    /// The proxy address to route through, if proxying is enabled.
    pub fn proxy(&self) -> Option<&str> {
        if self.use_proxy { self.proxy_url.as_deref() } else { None }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `VIDRELAY_`
    /// 2. TOML file from `VIDRELAY_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("VIDRELAY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("VIDRELAY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(&figment)
    }

    /// Extract and validate a configuration from an already-assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
