//! Chunk Fetcher Library
//!
//! The chunked-result retrieval layer of a database client: large query
//! results are split by the server into remotely-stored chunks, each
//! fetched over HTTP and decoded into rows. This crate owns the
//! resilient chunk downloader: issue the fetch for one chunk, classify
//! the outcome, retry under a tiered policy, and surface a precise typed
//! failure when the budget is exhausted.

pub mod app;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use app::{FetchPort, FetchResponse, HttpFetcher, ResultBatch, RetryPolicy};
pub use config::FetcherConfig;
pub use errors::{DownloadError, DownloadResult};
