//! Decode capability seam for downloaded chunk bodies
//!
//! Each wire format implements [`ChunkDecoder`]; the downloader itself
//! never depends on the format tag, it only hands the raw body over.
//! Only the JSON decoder lives here; columnar formats implement the same
//! trait downstream.

use bytes::Bytes;
use serde_json::Value;

use crate::app::models::{DecodeFormat, ResultBatch, RowRepresentation};
use crate::errors::{DecodeError, DecodeResult};

/// Capability to turn a successfully downloaded chunk body into rows
pub trait ChunkDecoder {
    /// Row container this decoder produces
    type Rows;

    /// Wire format this decoder understands
    fn format(&self) -> DecodeFormat;

    /// Decode a chunk body using the batch's schema and row
    /// representation
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the body does not match the format or
    /// disagrees with the shared schema.
    fn decode(&self, batch: &ResultBatch, body: &Bytes) -> DecodeResult<Self::Rows>;
}

/// Decoder for JSON-encoded chunks
///
/// The server encodes a chunk as a JSON array of rows, each row an array
/// of column values in schema order. Depending on the batch's row
/// representation the decoder passes the lists through or re-keys them
/// into column-name mappings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    fn value_kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl ChunkDecoder for JsonDecoder {
    type Rows = Vec<Value>;

    fn format(&self) -> DecodeFormat {
        DecodeFormat::Json
    }

    fn decode(&self, batch: &ResultBatch, body: &Bytes) -> DecodeResult<Self::Rows> {
        let parsed: Value = serde_json::from_slice(body)?;
        let rows = match parsed {
            Value::Array(rows) => rows,
            other => {
                return Err(DecodeError::UnexpectedShape {
                    expected: "array".to_string(),
                    found: Self::value_kind(&other).to_string(),
                })
            }
        };

        let schema = batch.schema();
        let mut decoded = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let values = match row {
                Value::Array(values) => values,
                other => {
                    return Err(DecodeError::UnexpectedShape {
                        expected: "array".to_string(),
                        found: Self::value_kind(&other).to_string(),
                    })
                }
            };
            if values.len() != schema.len() {
                return Err(DecodeError::ColumnCountMismatch {
                    row: index,
                    expected: schema.len(),
                    found: values.len(),
                });
            }
            decoded.push(match batch.row_repr() {
                RowRepresentation::List => Value::Array(values),
                RowRepresentation::Map => {
                    let mut object = serde_json::Map::with_capacity(values.len());
                    for (column, value) in schema.iter().zip(values) {
                        object.insert(column.name.clone(), value);
                    }
                    Value::Object(object)
                }
            });
        }

        tracing::debug!(rows = decoded.len(), "decoded JSON chunk");

        Ok(decoded)
    }
}
