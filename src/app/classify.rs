//! Status classification for chunk fetch outcomes
//!
//! The classifier is a pure function from an HTTP status code to one of
//! four outcome categories. It is total over the whole status space:
//! anything that is not explicitly OK, Unauthorized, or a non-OK
//! success-like status falls back to `Retryable`, the conservative
//! default for unknown error codes.

use crate::constants::http;

/// Outcome category of one fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Status was exactly 200; the response is a valid chunk body and the
    /// retry loop terminates immediately
    Success,
    /// Status was exactly 401; retried up to the budget, but exhaustion
    /// escalates to a connection error because a repeated 401 means the
    /// session itself is broken rather than a transient network blip
    AuthFailure,
    /// Any other 2xx/3xx status (201 Created, 302 Found, ...): successful
    /// at the transport level but never a valid chunk response, and
    /// waiting cannot make it one
    UnexpectedSuccess,
    /// Everything else: 4xx, 5xx, unknown codes, and transport-level
    /// failures
    Retryable,
}

impl FetchOutcome {
    /// Whether this outcome terminates the retry loop with the response
    pub fn is_success(self) -> bool {
        matches!(self, FetchOutcome::Success)
    }
}

/// Classify an HTTP status code into its fetch outcome category
pub fn classify_status(status: u16) -> FetchOutcome {
    match status {
        http::STATUS_OK => FetchOutcome::Success,
        http::STATUS_UNAUTHORIZED => FetchOutcome::AuthFailure,
        201..=399 => FetchOutcome::UnexpectedSuccess,
        _ => FetchOutcome::Retryable,
    }
}
