//! Error types for the connector.
//!
//! Every public operation returns [`ConnectorError`]. Faults raised by a
//! backend driver are [`BackendFault`]s and are reclassified on the way out
//! (see [`crate::query::classify`]), so callers never see raw driver errors.

use thiserror::Error;

use crate::statement::CurrentStatement;

/// Main error type for connector operations.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Generic, user-facing query failure with the backend's message.
    ///
    /// When the failure happened while submitting a statement of a script,
    /// the statement is attached so the caller can point at it.
    #[error("Query error: {message}")]
    Query {
        message: String,
        statement: Option<Box<CurrentStatement>>,
    },

    /// The handle or session is no longer valid; the query must be restarted.
    #[error("Query expired: {0}")]
    QueryExpired(String),

    /// The backend reported a timeout, or a caller deadline was exceeded.
    #[error("Operation timed out: {0}")]
    OperationTimeout(String),

    /// The operation does not apply to this engine or state.
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    /// The caller-held handle could not be decoded.
    #[error("Malformed query handle: {0}")]
    MalformedHandle(String),

    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConnectorError {
    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query {
            message: msg.into(),
            statement: None,
        }
    }

    /// Creates a query error tied to the statement that was being submitted.
    pub fn statement_failed(msg: impl Into<String>, statement: CurrentStatement) -> Self {
        Self::Query {
            message: msg.into(),
            statement: Some(Box::new(statement)),
        }
    }

    /// Creates an expired-query error with the given message.
    pub fn expired(msg: impl Into<String>) -> Self {
        Self::QueryExpired(msg.into())
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::OperationTimeout(msg.into())
    }

    /// Creates a not-supported error with the given message.
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::OperationNotSupported(msg.into())
    }

    /// Creates a malformed-handle error with the given message.
    pub fn malformed_handle(msg: impl Into<String>) -> Self {
        Self::MalformedHandle(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Query { .. } => "Query Error",
            Self::QueryExpired(_) => "Query Expired",
            Self::OperationTimeout(_) => "Operation Timeout",
            Self::OperationNotSupported(_) => "Operation Not Supported",
            Self::MalformedHandle(_) => "Malformed Handle",
            Self::Config(_) => "Configuration Error",
        }
    }

    /// True when the caller should offer to restart the query.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::QueryExpired(_))
    }

    /// True when the caller should suppress the action instead of showing an error.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::OperationNotSupported(_))
    }
}

/// Fault raised by a backend driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendFault {
    /// Generic structured fault from the service layer.
    #[error("{0}")]
    Structured(String),

    /// Fault raised by the query server session (bad handle, rejected query, ...).
    #[error("{0}")]
    Session(String),
}

impl BackendFault {
    /// Returns the backend's message.
    pub fn message(&self) -> &str {
        match self {
            Self::Structured(msg) | Self::Session(msg) => msg,
        }
    }
}

impl From<BackendFault> for ConnectorError {
    fn from(fault: BackendFault) -> Self {
        crate::query::classify::classify_fault(fault)
    }
}

/// Result type alias using ConnectorError.
pub type Result<T> = std::result::Result<T, ConnectorError>;
