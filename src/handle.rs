//! Query handle codec.
//!
//! A backend operation is identified by a binary `secret`/`guid` pair. Between
//! calls the caller keeps it in a flat JSON document (the snippet's result
//! handle) with both ids base64 encoded, next to the multi-statement fields.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConnectorError, Result};

/// Flat document the caller keeps between calls.
pub type HandleDocument = Map<String, Value>;

/// Keys of a handle document that belong to the backend handle.
pub const HANDLE_FIELDS: [&str; 6] = [
    "log_context",
    "secret",
    "has_result_set",
    "operation_type",
    "modified_row_count",
    "guid",
];

/// Backend-native handle of a running operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationHandle {
    pub secret: Vec<u8>,
    pub guid: Vec<u8>,
    pub operation_type: i32,
    pub has_result_set: bool,
    pub modified_row_count: Option<i64>,
    pub log_context: Option<String>,
}

/// Transportable form of an [`OperationHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedHandle {
    pub secret: String,
    pub guid: String,
    #[serde(default)]
    pub operation_type: i32,
    #[serde(default)]
    pub has_result_set: bool,
    #[serde(default)]
    pub modified_row_count: Option<i64>,
    #[serde(default)]
    pub log_context: Option<String>,
}

/// Encodes a backend handle for transport.
pub fn encode(handle: &OperationHandle) -> EncodedHandle {
    EncodedHandle {
        secret: STANDARD.encode(&handle.secret),
        guid: STANDARD.encode(&handle.guid),
        operation_type: handle.operation_type,
        has_result_set: handle.has_result_set,
        modified_row_count: handle.modified_row_count,
        log_context: handle.log_context.clone(),
    }
}

/// Decodes the backend handle from a handle document.
///
/// Keys outside [`HANDLE_FIELDS`] (statement position, UI state, ...) are
/// ignored.
pub fn decode(document: &HandleDocument) -> Result<OperationHandle> {
    let fields: HandleDocument = document
        .iter()
        .filter(|(key, _)| HANDLE_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let encoded: EncodedHandle = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ConnectorError::malformed_handle(e.to_string()))?;

    Ok(OperationHandle {
        secret: decode_id("secret", &encoded.secret)?,
        guid: decode_id("guid", &encoded.guid)?,
        operation_type: encoded.operation_type,
        has_result_set: encoded.has_result_set,
        modified_row_count: encoded.modified_row_count,
        log_context: encoded.log_context,
    })
}

fn decode_id(field: &str, value: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| ConnectorError::malformed_handle(format!("invalid {field}: {e}")))?;
    if bytes.is_empty() {
        return Err(ConnectorError::malformed_handle(format!("empty {field}")));
    }
    Ok(bytes)
}
