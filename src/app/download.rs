//! Chunk download executor
//!
//! Per-chunk orchestration: a [`ResultBatch`] owns its chunk location and
//! exposes `download`, which drives the retry controller with the global
//! attempt budget and hands the raw successful response to the
//! downstream decoder. The executor adds no error translation of its
//! own; controller failures propagate unchanged.

use tokio::sync::mpsc;

use crate::app::client::{FetchPort, FetchResponse};
use crate::app::models::ResultBatch;
use crate::app::retry::{fetch_with_retry, RetryPolicy};
use crate::errors::{DownloadError, DownloadResult};

impl ResultBatch {
    /// Download this chunk, retrying up to the global budget
    ///
    /// The caller is suspended for the full duration of unsuccessful
    /// retries; there is no internal concurrency. Re-invoking `download`
    /// re-runs the full retry loop with a fresh budget. On success the
    /// raw response is returned unmodified; decoding is the caller's
    /// concern.
    ///
    /// # Errors
    ///
    /// Propagates the terminal [`DownloadError`] raised by the retry
    /// controller unchanged.
    pub async fn download<F>(&self, fetcher: &F) -> DownloadResult<FetchResponse>
    where
        F: FetchPort + ?Sized,
    {
        self.download_with_policy(fetcher, &RetryPolicy::default())
            .await
    }

    /// Download this chunk under an explicit retry policy
    ///
    /// Exists so callers (and tests) can substitute the backoff schedule;
    /// production code uses [`download`](Self::download).
    pub async fn download_with_policy<F>(
        &self,
        fetcher: &F,
        policy: &RetryPolicy,
    ) -> DownloadResult<FetchResponse>
    where
        F: FetchPort + ?Sized,
    {
        fetch_with_retry(fetcher, self.location(), policy).await
    }

    /// Download this chunk, aborting if a shutdown signal arrives
    ///
    /// A signal received mid-fetch or mid-sleep drops the retry loop and
    /// returns [`DownloadError::Cancelled`], never one of the three
    /// terminal shapes.
    pub async fn download_with_shutdown<F>(
        &self,
        fetcher: &F,
        policy: &RetryPolicy,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> DownloadResult<FetchResponse>
    where
        F: FetchPort + ?Sized,
    {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                tracing::debug!(url = %self.location().url(), "chunk download cancelled by shutdown signal");
                Err(DownloadError::Cancelled)
            }
            result = self.download_with_policy(fetcher, policy) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{ChunkLocation, ColumnInfo, DecodeFormat, RowRepresentation};
    use crate::errors::{TransportError, TransportResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    struct FixedStatusPort {
        status: u16,
        calls: AtomicU32,
    }

    impl FixedStatusPort {
        fn new(status: u16) -> Self {
            Self {
                status,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl FetchPort for FixedStatusPort {
        async fn get(&self, _location: &ChunkLocation) -> TransportResult<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse {
                status: self.status,
                body: Bytes::from_static(b"[]"),
            })
        }
    }

    /// Port that never resolves, for exercising cancellation mid-fetch.
    struct StalledPort;

    #[async_trait]
    impl FetchPort for StalledPort {
        async fn get(&self, _location: &ChunkLocation) -> TransportResult<FetchResponse> {
            std::future::pending::<()>().await;
            Err(TransportError::Timeout { seconds: 0 })
        }
    }

    fn batch() -> ResultBatch {
        let schema: Arc<[ColumnInfo]> = vec![ColumnInfo::new("id", "NUMBER")].into();
        ResultBatch::new(
            100,
            schema,
            ChunkLocation::new(
                Url::parse("https://results.example.com/chunk/7").unwrap(),
                vec![("x-result-key".to_string(), "k".to_string())],
            ),
            DecodeFormat::Json,
            RowRepresentation::List,
        )
    }

    #[tokio::test]
    async fn download_returns_raw_response_on_success() {
        let port = FixedStatusPort::new(200);
        let response = batch().download(&port).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"[]");
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn redownload_reruns_the_full_retry_loop() {
        let port = FixedStatusPort::new(503);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::no_delay()
        };
        let batch = batch();
        assert!(batch.download_with_policy(&port, &policy).await.is_err());
        assert!(batch.download_with_policy(&port, &policy).await.is_err());
        // Budget resets per invocation.
        assert_eq!(port.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn shutdown_signal_cancels_mid_fetch() {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let policy = RetryPolicy::no_delay();
        shutdown_tx.send(()).await.unwrap();

        let err = batch()
            .download_with_shutdown(&StalledPort, &policy, &mut shutdown_rx)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Cancelled));
    }

    #[tokio::test]
    async fn shutdown_signal_cancels_mid_sleep() {
        let port = FixedStatusPort::new(503);
        // Long backoff so the loop parks in its sleep.
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
        };
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let batch = batch();
        let download = batch.download_with_shutdown(&port, &policy, &mut shutdown_rx);
        tokio::pin!(download);

        // First poll drives the fetch and parks the loop in the backoff
        // sleep; the signal must then abort it.
        tokio::select! {
            _ = &mut download => panic!("download finished before the signal"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        shutdown_tx.send(()).await.unwrap();
        let err = download.await.unwrap_err();
        assert!(matches!(err, DownloadError::Cancelled));
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);
    }
}
