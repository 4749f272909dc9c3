//! Retry and backoff controller for chunk downloads
//!
//! Drives a bounded attempt loop around the fetch port and the status
//! classifier. Every non-success attempt is recovered locally (logged and
//! retried after a backoff sleep) until the budget is exhausted, at which
//! point the category of the final attempt picks the terminal failure
//! shape. Success short-circuits the loop on the attempt it occurs.

use std::time::Duration;

use async_trait::async_trait;

use crate::app::classify::{classify_status, FetchOutcome};
use crate::app::client::{FetchPort, FetchResponse};
use crate::app::models::ChunkLocation;
use crate::constants::limits;
use crate::errors::{DownloadError, DownloadResult, TransportError};

/// Clock abstraction for the inter-attempt sleep
///
/// Injected so tests can run the full retry budget without wall-clock
/// delay. Production code uses [`TokioSleeper`].
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the caller for `delay`
    async fn sleep(&self, delay: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Sleeper that returns immediately, for tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _delay: Duration) {}
}

/// Backoff schedule and attempt budget for one chunk download
///
/// Tests substitute a no-op sleep by injecting [`NoopSleeper`] or by
/// using [`RetryPolicy::no_delay`]; the controller never sleeps when the
/// computed delay is zero.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of fetch attempts (including the first)
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: limits::MAX_DOWNLOAD_RETRY,
            base_delay: limits::RETRY_BASE_DELAY,
            max_delay: limits::MAX_BACKOFF_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with the full attempt budget but zero inter-attempt delay
    ///
    /// Lets tests run the whole budget without wall-clock sleeps.
    pub fn no_delay() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Backoff delay before the attempt following `attempt` (1-based)
    ///
    /// Exponential `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

/// What the final attempt observed, kept only to build the terminal
/// failure once the budget runs out
#[derive(Debug)]
enum LastAttempt {
    Status { status: u16, outcome: FetchOutcome },
    Transport(TransportError),
}

impl LastAttempt {
    fn into_terminal(self, location: &ChunkLocation, attempts: u32) -> DownloadError {
        match self {
            LastAttempt::Status { status, outcome } => match outcome {
                FetchOutcome::AuthFailure => {
                    DownloadError::ConnectionRejected { status, attempts }
                }
                FetchOutcome::UnexpectedSuccess => {
                    DownloadError::MalformedResponse { status, attempts }
                }
                // Success returns from the loop before exhaustion can
                // observe it.
                FetchOutcome::Retryable | FetchOutcome::Success => {
                    DownloadError::RetryDownload {
                        message: format!(
                            "HTTP {} fetching chunk {} after {} attempts",
                            status,
                            location.url(),
                            attempts
                        ),
                    }
                }
            },
            LastAttempt::Transport(error) => DownloadError::RetryDownload {
                message: format!(
                    "transport failure fetching chunk {} after {} attempts: {}",
                    location.url(),
                    attempts,
                    error
                ),
            },
        }
    }
}

/// Fetch one chunk, retrying under `policy` until success or exhaustion
///
/// Classification is re-evaluated independently on every attempt; a
/// sequence that alternates categories uses only the final attempt's
/// category to pick the terminal shape. The fetch port is invoked at
/// most `policy.max_attempts` times.
///
/// # Errors
///
/// Returns the terminal [`DownloadError`] shape dictated by the final
/// attempt's category once the budget is exhausted.
pub async fn fetch_with_retry<F>(
    fetcher: &F,
    location: &ChunkLocation,
    policy: &RetryPolicy,
) -> DownloadResult<FetchResponse>
where
    F: FetchPort + ?Sized,
{
    fetch_with_retry_using(fetcher, location, policy, &TokioSleeper).await
}

/// [`fetch_with_retry`] with an explicit sleep implementation
pub async fn fetch_with_retry_using<F, S>(
    fetcher: &F,
    location: &ChunkLocation,
    policy: &RetryPolicy,
    sleeper: &S,
) -> DownloadResult<FetchResponse>
where
    F: FetchPort + ?Sized,
    S: Sleeper + ?Sized,
{
    debug_assert!(policy.max_attempts > 0);

    let mut attempt = 1u32;
    loop {
        let last = match fetcher.get(location).await {
            Ok(response) => {
                let outcome = classify_status(response.status);
                if outcome.is_success() {
                    tracing::debug!(
                        attempt,
                        url = %location.url(),
                        "chunk fetched successfully"
                    );
                    return Ok(response);
                }
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    status = response.status,
                    url = %location.url(),
                    "chunk fetch attempt rejected"
                );
                LastAttempt::Status {
                    status: response.status,
                    outcome,
                }
            }
            // Transport failures are retryable without further inspection.
            Err(error) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    url = %location.url(),
                    "chunk fetch attempt failed: {error}"
                );
                LastAttempt::Transport(error)
            }
        };

        if attempt >= policy.max_attempts {
            let terminal = last.into_terminal(location, attempt);
            tracing::error!(
                attempts = attempt,
                category = terminal.category(),
                url = %location.url(),
                "chunk download failed: {terminal}"
            );
            return Err(terminal);
        }

        let delay = policy.backoff_delay(attempt);
        if !delay.is_zero() {
            sleeper.sleep(delay).await;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::FetchResponse;
    use crate::errors::TransportResult;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use url::Url;

    /// Fetch port that replays a fixed status script; the last entry
    /// repeats once the script runs out.
    struct ScriptedPort {
        script: Mutex<Vec<u16>>,
        calls: AtomicU32,
    }

    impl ScriptedPort {
        fn new(script: &[u16]) -> Self {
            Self {
                script: Mutex::new(script.to_vec()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FetchPort for ScriptedPort {
        async fn get(&self, _location: &ChunkLocation) -> TransportResult<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let status = if script.len() > 1 {
                script.remove(0)
            } else {
                script[0]
            };
            Ok(FetchResponse {
                status,
                body: Bytes::from_static(if status == 200 { b"rows" } else { b"fail" }),
            })
        }
    }

    fn location() -> ChunkLocation {
        ChunkLocation::new(
            Url::parse("https://results.example.com/chunk/0").unwrap(),
            vec![],
        )
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let d1 = policy.backoff_delay(1);
        let d2 = policy.backoff_delay(2);
        assert!(d2 > d1);
        assert!(policy.backoff_delay(30) <= policy.max_delay);
    }

    #[test]
    fn no_delay_policy_keeps_full_budget() {
        let policy = RetryPolicy::no_delay();
        assert_eq!(policy.max_attempts, limits::MAX_DOWNLOAD_RETRY);
        assert!(policy.backoff_delay(5).is_zero());
    }

    #[tokio::test]
    async fn success_on_first_attempt_short_circuits() {
        let port = ScriptedPort::new(&[200]);
        let response = fetch_with_retry(&port, &location(), &RetryPolicy::no_delay())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(port.calls(), 1);
    }

    #[tokio::test]
    async fn final_category_picks_the_terminal_shape() {
        // Alternating categories; the last attempt is a 201, so the
        // terminal shape is a malformed response regardless of the
        // earlier 400 and 401.
        let mut script = vec![400, 401];
        script.resize(limits::MAX_DOWNLOAD_RETRY as usize, 201);
        let port = ScriptedPort::new(&script);
        let err = fetch_with_retry(&port, &location(), &RetryPolicy::no_delay())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::MalformedResponse { status: 201, .. }
        ));
        assert_eq!(port.calls(), limits::MAX_DOWNLOAD_RETRY);
    }

    /// Sleeper that counts how often it is invoked.
    #[derive(Default)]
    struct CountingSleeper {
        sleeps: AtomicU32,
    }

    #[async_trait]
    impl Sleeper for CountingSleeper {
        async fn sleep(&self, _delay: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_never_sleeps() {
        let port = ScriptedPort::new(&[200]);
        let sleeper = CountingSleeper::default();
        fetch_with_retry_using(&port, &location(), &RetryPolicy::default(), &sleeper)
            .await
            .unwrap();
        assert_eq!(sleeper.sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn injected_sleeper_replaces_the_backoff_sleep() {
        // Real delays in the policy, but the injected sleeper only
        // counts, so the whole budget runs instantly.
        let port = ScriptedPort::new(&[503]);
        let sleeper = CountingSleeper::default();
        let err = fetch_with_retry_using(&port, &location(), &RetryPolicy::default(), &sleeper)
            .await
            .unwrap_err();
        assert!(err.is_retry_signal());
        assert_eq!(port.calls(), limits::MAX_DOWNLOAD_RETRY);
        // One sleep between each pair of consecutive attempts.
        assert_eq!(
            sleeper.sleeps.load(Ordering::SeqCst),
            limits::MAX_DOWNLOAD_RETRY - 1
        );
    }

    #[tokio::test]
    async fn shrunk_budget_is_honored() {
        let port = ScriptedPort::new(&[503]);
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::no_delay()
        };
        let err = fetch_with_retry(&port, &location(), &policy).await.unwrap_err();
        assert!(err.is_retry_signal());
        assert!(err.to_string().contains("503"));
        assert_eq!(port.calls(), 3);
    }
}
