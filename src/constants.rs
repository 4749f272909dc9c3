//! Application constants for the chunk fetcher
//!
//! This module centralizes the stable values the downloader and its
//! collaborators agree on, organized by functional domain. External code
//! matches on the error and SQL-state codes, so treat them as frozen.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all chunk requests
    pub const USER_AGENT: &str = "chunk-fetcher/0.1.0";

    /// The canonical "OK" status: the only status accepted as a valid
    /// chunk response
    pub const STATUS_OK: u16 = 200;

    /// The "Unauthorized" status signalling a broken or expired session
    pub const STATUS_UNAUTHORIZED: u16 = 401;

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 25;
}

/// Retry budget and backoff configuration
pub mod limits {
    use super::Duration;

    /// Maximum number of fetch attempts per chunk download, across all
    /// outcome categories. Success short-circuits the loop early.
    pub const MAX_DOWNLOAD_RETRY: u32 = 10;

    /// Base delay for exponential backoff between attempts
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

    /// Upper bound on the backoff delay
    pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(16);
}

/// Machine-readable error codes attached to terminal download failures
pub mod codes {
    /// The session is broken: repeated 401 responses while fetching a chunk
    pub const ER_FAILED_TO_CONNECT: u32 = 250_001;

    /// The server answered with a success-like status that is not a valid
    /// chunk response
    pub const ER_FAILED_TO_REQUEST: u32 = 250_003;
}

/// Standardized connection-state codes (SQL state values)
pub mod sqlstate {
    /// Connection rejected by the server
    pub const CONNECTION_REJECTED: &str = "08004";

    /// Connection was not established
    pub const CONNECTION_NOT_ESTABLISHED: &str = "08001";
}

// Re-export commonly used constants for convenience
pub use codes::{ER_FAILED_TO_CONNECT, ER_FAILED_TO_REQUEST};
pub use http::{STATUS_OK, STATUS_UNAUTHORIZED, USER_AGENT};
pub use limits::{MAX_DOWNLOAD_RETRY, RETRY_BASE_DELAY};
pub use sqlstate::{CONNECTION_NOT_ESTABLISHED, CONNECTION_REJECTED};
