//! Data models for the chunk fetcher
//!
//! This module defines the core data structures shared across the crate:
//! the immutable location of one remotely-stored chunk, the column schema
//! descriptors shared with the overall result set, and the `ResultBatch`
//! that owns a chunk's location and decode metadata.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

/// Immutable descriptor of where a chunk lives
///
/// Created once when the server's chunk manifest is parsed and never
/// mutated afterwards. Header order is preserved because the server may
/// use it for request signing and caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLocation {
    url: Url,
    headers: Vec<(String, String)>,
}

impl ChunkLocation {
    /// Create a location from a fetch URL and its required headers
    pub fn new(url: Url, headers: Vec<(String, String)>) -> Self {
        Self { url, headers }
    }

    /// The URL the chunk must be fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Required request headers, in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Descriptor of one column in the shared result-set schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as reported by the server
    pub name: String,
    /// Server-side type name (informational; decoding is type-agnostic)
    #[serde(rename = "type", default)]
    pub type_name: String,
}

impl ColumnInfo {
    /// Create a column descriptor
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Wire format the chunk body is encoded in
///
/// The downloader never inspects this tag; it exists so the downstream
/// decoder can pick the right [`ChunkDecoder`](crate::app::decode::ChunkDecoder)
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFormat {
    /// Rows encoded as a JSON array
    Json,
    /// Rows encoded as Arrow IPC record batches
    Arrow,
}

/// Row representation consumed by the downstream decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowRepresentation {
    /// Rows as ordered value lists
    List,
    /// Rows as column-name to value mappings
    Map,
}

/// One fetchable unit of a larger query result
///
/// Constructed when the server's chunk manifest is parsed; downloaded and
/// decoded at most once per logical use (callers may re-invoke
/// `download`, which re-runs the full retry loop); dropped with the
/// result set. The schema is shared read-only with the overall result
/// set and with the other batches.
#[derive(Debug, Clone)]
pub struct ResultBatch {
    row_count: usize,
    schema: Arc<[ColumnInfo]>,
    location: ChunkLocation,
    format: DecodeFormat,
    row_repr: RowRepresentation,
}

impl ResultBatch {
    /// Create a batch for one chunk of the result set
    pub fn new(
        row_count: usize,
        schema: Arc<[ColumnInfo]>,
        location: ChunkLocation,
        format: DecodeFormat,
        row_repr: RowRepresentation,
    ) -> Self {
        Self {
            row_count,
            schema,
            location,
            format,
            row_repr,
        }
    }

    /// Number of rows the server reported for this chunk
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Shared column schema of the result set
    pub fn schema(&self) -> &Arc<[ColumnInfo]> {
        &self.schema
    }

    /// Where this chunk lives
    pub fn location(&self) -> &ChunkLocation {
        &self.location
    }

    /// Wire format of the chunk body
    pub fn format(&self) -> DecodeFormat {
        self.format
    }

    /// Row representation the decoder should produce
    pub fn row_repr(&self) -> RowRepresentation {
        self.row_repr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ChunkLocation {
        ChunkLocation::new(
            Url::parse("https://results.example.com/chunk/0").unwrap(),
            vec![
                ("x-amz-server-side-encryption".to_string(), "AES256".to_string()),
                ("x-result-key".to_string(), "abc123".to_string()),
            ],
        )
    }

    #[test]
    fn chunk_location_preserves_header_order() {
        let loc = location();
        let keys: Vec<&str> = loc.headers().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["x-amz-server-side-encryption", "x-result-key"]);
    }

    #[test]
    fn batches_share_one_schema() {
        let schema: Arc<[ColumnInfo]> = vec![
            ColumnInfo::new("id", "NUMBER"),
            ColumnInfo::new("name", "TEXT"),
        ]
        .into();
        let a = ResultBatch::new(
            100,
            Arc::clone(&schema),
            location(),
            DecodeFormat::Json,
            RowRepresentation::List,
        );
        let b = ResultBatch::new(
            50,
            Arc::clone(&schema),
            location(),
            DecodeFormat::Json,
            RowRepresentation::Map,
        );
        assert!(Arc::ptr_eq(a.schema(), b.schema()));
        assert_eq!(a.row_count(), 100);
        assert_eq!(b.row_repr(), RowRepresentation::Map);
    }
}
