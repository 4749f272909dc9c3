//! Error types for the chunk fetcher
//!
//! Errors are split by domain: transport-level failures raised by the
//! fetch port, terminal download failures raised when the retry budget is
//! exhausted, manifest parsing errors, and decode errors. The download
//! shapes carry stable machine-readable codes that external code matches
//! on, so their accessors are part of the public contract.

use thiserror::Error;

use crate::constants::{codes, sqlstate};

/// Transport-level failures raised by the fetch port
///
/// Every transport failure is classified as retryable by the download
/// loop; no field inspection happens beyond building the diagnostic
/// message.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed before a status code was produced
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Request did not complete within the configured timeout
    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The chunk URL could not be parsed
    #[error("invalid chunk URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// A required chunk header could not be encoded for the request
    #[error("invalid chunk request header {name}: {error}")]
    InvalidHeader { name: String, error: String },
}

/// Terminal failures of one chunk download
///
/// The first two variants are hard failures of the query and should be
/// surfaced to the caller as-is. `RetryDownload` is a control error: an
/// outer orchestration layer is expected to catch it and decide whether
/// to re-authenticate, refresh the chunk locations, or abandon the query.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Every attempt answered 401: the session itself is broken, not the
    /// network
    #[error("connection to the chunk server was rejected: HTTP {status} after {attempts} attempts")]
    ConnectionRejected { status: u16, attempts: u32 },

    /// Every remaining attempt answered a success-like status that is not
    /// a valid chunk response (e.g. 201 or 302); waiting cannot fix this
    #[error("chunk request failed: unexpected HTTP {status} after {attempts} attempts")]
    MalformedResponse { status: u16, attempts: u32 },

    /// Retryable failures exhausted the budget; an outer layer may retry
    /// with fresh chunk locations or credentials
    #[error("chunk download must be retried at a higher layer: {message}")]
    RetryDownload { message: String },

    /// The download was aborted by a shutdown signal mid-fetch or
    /// mid-sleep; distinct from all terminal shapes
    #[error("chunk download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Machine-readable error code, if this shape carries one
    pub fn error_code(&self) -> Option<u32> {
        match self {
            DownloadError::ConnectionRejected { .. } => Some(codes::ER_FAILED_TO_CONNECT),
            DownloadError::MalformedResponse { .. } => Some(codes::ER_FAILED_TO_REQUEST),
            DownloadError::RetryDownload { .. } | DownloadError::Cancelled => None,
        }
    }

    /// Standardized connection-state code, if this shape carries one
    pub fn sqlstate(&self) -> Option<&'static str> {
        match self {
            DownloadError::ConnectionRejected { .. } => Some(sqlstate::CONNECTION_REJECTED),
            DownloadError::MalformedResponse { .. } => {
                Some(sqlstate::CONNECTION_NOT_ESTABLISHED)
            }
            DownloadError::RetryDownload { .. } | DownloadError::Cancelled => None,
        }
    }

    /// Whether this is the control error an outer orchestration layer
    /// should catch rather than surface to the user
    pub fn is_retry_signal(&self) -> bool {
        matches!(self, DownloadError::RetryDownload { .. })
    }

    /// Error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::ConnectionRejected { .. } => "connection",
            DownloadError::MalformedResponse { .. } => "malformed-response",
            DownloadError::RetryDownload { .. } => "retry-signal",
            DownloadError::Cancelled => "cancelled",
        }
    }
}

/// Chunk manifest parsing errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// JSON parsing error in the server's chunk listing
    #[error("JSON parsing error in chunk manifest")]
    JsonParse(#[from] serde_json::Error),

    /// A chunk entry carried an unparsable URL
    #[error("invalid chunk URL in manifest: {url}")]
    InvalidUrl { url: String },

    /// A chunk entry reported a negative row count
    #[error("negative row count in manifest entry for {url}: {row_count}")]
    NegativeRowCount { url: String, row_count: i64 },

    /// A required chunk header value was not a string
    #[error("invalid chunk header value for {name}")]
    InvalidHeader { name: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    NotFound { path: std::path::PathBuf },

    /// Invalid configuration format
    #[error("invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// I/O error reading configuration
    #[error("I/O error reading configuration")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding a successfully downloaded chunk body
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body was not valid for the batch's decode format
    #[error("chunk body could not be decoded")]
    JsonParse(#[from] serde_json::Error),

    /// The body's top level was not the expected row container
    #[error("chunk body is not a row set: expected {expected}, got {found}")]
    UnexpectedShape { expected: String, found: String },

    /// A row's width did not match the shared column schema
    #[error("row {row} has {found} values but the schema has {expected} columns")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Decode result type alias
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_rejected_carries_code_state_and_status() {
        let err = DownloadError::ConnectionRejected {
            status: 401,
            attempts: 10,
        };
        assert_eq!(err.error_code(), Some(codes::ER_FAILED_TO_CONNECT));
        assert_eq!(err.sqlstate(), Some("08004"));
        assert!(err.to_string().contains("401"));
        assert!(!err.is_retry_signal());
    }

    #[test]
    fn malformed_response_carries_code_and_state() {
        let err = DownloadError::MalformedResponse {
            status: 302,
            attempts: 10,
        };
        assert_eq!(err.error_code(), Some(codes::ER_FAILED_TO_REQUEST));
        assert_eq!(err.sqlstate(), Some("08001"));
        assert_eq!(err.category(), "malformed-response");
    }

    #[test]
    fn retry_signal_has_no_code_or_state() {
        let err = DownloadError::RetryDownload {
            message: "HTTP 503".to_string(),
        };
        assert_eq!(err.error_code(), None);
        assert_eq!(err.sqlstate(), None);
        assert!(err.is_retry_signal());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn cancelled_is_not_a_terminal_shape() {
        let err = DownloadError::Cancelled;
        assert_eq!(err.error_code(), None);
        assert_eq!(err.sqlstate(), None);
        assert!(!err.is_retry_signal());
        assert_eq!(err.category(), "cancelled");
    }
}
