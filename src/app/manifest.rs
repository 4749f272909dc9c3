//! Chunk manifest parsing
//!
//! When a query result is too large to inline, the server's response
//! carries a manifest: the shared column schema, a list of chunk entries
//! (fetch URL and row count), and one ordered set of headers that every
//! chunk request must carry. This module turns that JSON payload into
//! `ResultBatch`es sharing a single schema allocation.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::app::models::{
    ChunkLocation, ColumnInfo, DecodeFormat, ResultBatch, RowRepresentation,
};
use crate::errors::{ManifestError, ManifestResult};

/// One chunk entry in the server's manifest
#[derive(Debug, Deserialize)]
struct ChunkEntry {
    url: String,
    #[serde(rename = "rowCount")]
    row_count: i64,
}

/// Wire shape of the manifest payload
#[derive(Debug, Deserialize)]
struct ManifestPayload {
    #[serde(rename = "rowtype", default)]
    rowtype: Vec<ColumnInfo>,
    #[serde(default)]
    chunks: Vec<ChunkEntry>,
    /// Headers required on every chunk request. Insertion order matters
    /// for signing, so the JSON object order is preserved.
    #[serde(rename = "chunkHeaders", default)]
    chunk_headers: serde_json::Map<String, Value>,
    #[serde(default)]
    format: Option<DecodeFormat>,
}

/// Parse a chunk manifest payload into downloadable batches
///
/// All batches share one schema allocation and carry their own copy of
/// the required headers in manifest order. `row_repr` selects the row
/// representation the downstream decoder will produce.
///
/// # Errors
///
/// Returns `ManifestError` if the payload is not valid JSON, a chunk URL
/// does not parse, a header value is not a string, or a row count is
/// negative.
pub fn parse_chunk_manifest(
    payload: &[u8],
    row_repr: RowRepresentation,
) -> ManifestResult<Vec<ResultBatch>> {
    let manifest: ManifestPayload = serde_json::from_slice(payload)?;

    let mut headers = Vec::with_capacity(manifest.chunk_headers.len());
    for (name, value) in &manifest.chunk_headers {
        let value = value
            .as_str()
            .ok_or_else(|| ManifestError::InvalidHeader { name: name.clone() })?;
        headers.push((name.clone(), value.to_string()));
    }

    let schema: Arc<[ColumnInfo]> = manifest.rowtype.into();
    let format = manifest.format.unwrap_or(DecodeFormat::Json);

    let mut batches = Vec::with_capacity(manifest.chunks.len());
    for entry in manifest.chunks {
        let url = Url::parse(&entry.url).map_err(|_| ManifestError::InvalidUrl {
            url: entry.url.clone(),
        })?;
        if entry.row_count < 0 {
            return Err(ManifestError::NegativeRowCount {
                url: entry.url,
                row_count: entry.row_count,
            });
        }
        batches.push(ResultBatch::new(
            entry.row_count as usize,
            Arc::clone(&schema),
            ChunkLocation::new(url, headers.clone()),
            format,
            row_repr,
        ));
    }

    tracing::debug!(
        chunks = batches.len(),
        columns = schema.len(),
        "parsed chunk manifest"
    );

    Ok(batches)
}

/// Total row count across all batches in a manifest
pub fn total_rows(batches: &[ResultBatch]) -> usize {
    batches.iter().map(ResultBatch::row_count).sum()
}
