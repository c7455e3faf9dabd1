//! Request and response types exchanged with a query server driver.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::properties::{FileResource, Function, Setting};

/// A statement ready for submission, with everything it needs on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub statement: String,
    pub settings: Vec<Setting>,
    pub file_resources: Vec<FileResource>,
    pub functions: Vec<Function>,
    pub database: String,
}

impl QueryRequest {
    /// Creates a request for a bare statement against a database.
    pub fn new(statement: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            settings: Vec::new(),
            file_resources: Vec::new(),
            functions: Vec::new(),
            database: database.into(),
        }
    }
}

/// Operation states as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackendOperationState {
    Initialized,
    Running,
    Finished,
    Canceled,
    Closed,
    Error,
    Unknown,
    Pending,
}

/// Result of polling an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatus {
    pub state: BackendOperationState,
    pub error_message: Option<String>,
}

impl OperationStatus {
    pub fn new(state: BackendOperationState) -> Self {
        Self {
            state,
            error_message: None,
        }
    }

    pub fn failed(state: BackendOperationState, message: impl Into<String>) -> Self {
        Self {
            state,
            error_message: Some(message.into()),
        }
    }
}

/// Column metadata of a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: None,
        }
    }
}

/// A page of rows fetched from an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRows {
    pub has_more: bool,
    pub rows: Vec<Vec<Value>>,
    pub columns: Vec<ColumnMeta>,
}

/// Query plan returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub textual: String,
}

/// A server-side session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSession {
    pub id: i64,
    pub application: String,
    pub owner: String,
    pub status_code: i32,
    /// Server-reported configuration, flattened to key/value pairs.
    #[serde(default)]
    pub properties: Vec<Setting>,
}
