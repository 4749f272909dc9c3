//! HTTP fetch port and its reqwest-backed implementation
//!
//! The downloader consumes the transport through the [`FetchPort`] trait:
//! perform one GET against a chunk URL with its required headers and
//! return a status code plus body, or a transport failure. Production
//! code uses [`HttpFetcher`]; tests inject scripted ports.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::app::models::ChunkLocation;
use crate::constants::http;
use crate::errors::{TransportError, TransportResult};

/// Raw result of one successful GET against a chunk URL
///
/// "Successful" here means transport-level only: the status code has not
/// been classified yet. The body is handed to the downstream decoder
/// unmodified once the retry loop accepts the response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code of the response
    pub status: u16,
    /// Response body bytes
    pub body: Bytes,
}

/// Capability to fetch one chunk over the network
///
/// Implementations perform a single GET and report either the response
/// or a transport-level failure. They must not retry internally; the
/// retry loop owns the attempt budget.
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Perform one GET against the chunk's URL with its required headers
    async fn get(&self, location: &ChunkLocation) -> TransportResult<FetchResponse>;
}

/// Configuration for the reqwest-backed fetch port
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

/// Production fetch port backed by a shared `reqwest::Client`
///
/// Connection pooling, TLS, and DNS live inside reqwest; this type only
/// shapes one GET per call. Cloning is cheap and clones share the pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if HTTP client creation fails
    pub fn new() -> TransportResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a fetcher with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if HTTP client creation fails
    pub fn with_config(config: ClientConfig) -> TransportResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(config.tcp_nodelay)
            .pool_max_idle_per_host(config.pool_max_per_host);

        if let Some(keepalive) = config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = config.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle_timeout);
        }

        let client = builder.build().map_err(TransportError::Http)?;

        tracing::debug!("created chunk fetch client");

        Ok(Self { client })
    }

    /// Build the per-request header map from the chunk's ordered headers
    fn header_map(location: &ChunkLocation) -> TransportResult<HeaderMap> {
        let mut map = HeaderMap::with_capacity(location.headers().len());
        for (key, value) in location.headers() {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: key.clone(),
                    error: e.to_string(),
                }
            })?;
            let value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                    name: key.clone(),
                    error: e.to_string(),
                })?;
            map.append(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl FetchPort for HttpFetcher {
    async fn get(&self, location: &ChunkLocation) -> TransportResult<FetchResponse> {
        let headers = Self::header_map(location)?;

        let response = self
            .client
            .get(location.url().clone())
            .headers(headers)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(TransportError::Http)?;

        tracing::debug!(status, bytes = body.len(), url = %location.url(), "fetched chunk response");

        Ok(FetchResponse { status, body })
    }
}
