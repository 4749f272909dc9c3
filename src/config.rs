//! Configuration management for the chunk fetcher
//!
//! TOML-friendly configuration structs with zero-config defaults. The
//! TOML shapes convert into the runtime [`ClientConfig`] and
//! [`RetryPolicy`] consumed by the fetch port and the retry controller.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{ClientConfig, RetryPolicy};
use crate::constants::{http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Unified fetcher configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FetcherConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Retry budget and backoff settings
    pub retry: RetryConfigToml,
}

impl FetcherConfig {
    /// Parse a configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the TOML does not parse
    pub fn from_toml_str(toml_str: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, or does
    /// not parse
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded fetcher configuration");
        Ok(config)
    }
}

/// TOML-friendly HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout (e.g. "60s")
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// TCP keep-alive interval (absent = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (absent = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
        }
    }
}

impl From<ClientConfigToml> for ClientConfig {
    fn from(toml: ClientConfigToml) -> Self {
        Self {
            tcp_keepalive: toml.tcp_keepalive,
            tcp_nodelay: toml.tcp_nodelay,
            pool_idle_timeout: toml.pool_idle_timeout,
            pool_max_per_host: toml.pool_max_per_host,
            request_timeout: toml.request_timeout,
            connect_timeout: toml.connect_timeout,
        }
    }
}

/// TOML-friendly retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfigToml {
    /// Maximum fetch attempts per chunk download
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound on the backoff delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryConfigToml {
    fn default() -> Self {
        Self {
            max_attempts: limits::MAX_DOWNLOAD_RETRY,
            base_delay: limits::RETRY_BASE_DELAY,
            max_delay: limits::MAX_BACKOFF_DELAY,
        }
    }
}

impl From<RetryConfigToml> for RetryPolicy {
    fn from(toml: RetryConfigToml) -> Self {
        Self {
            max_attempts: toml.max_attempts,
            base_delay: toml.base_delay,
            max_delay: toml.max_delay,
        }
    }
}
