//! Classification of backend outcomes into the connector's error taxonomy.
//!
//! Current servers only describe failures in free text, so the rules below
//! match message substrings. They are kept in this one place so that servers
//! reporting structured error codes can be supported without touching
//! callers.

use serde::{Deserialize, Serialize};

use crate::driver::{BackendOperationState, OperationStatus};
use crate::error::{BackendFault, ConnectorError, Result};

const TIMED_OUT: &str = "timed out";
const INVALID_HANDLE_MARKERS: [&str; 2] = ["Invalid query handle", "Invalid OperationHandle"];
/// Hive reports a user cancellation racing the end of a query as this error.
const CANCELED_TO_ERROR: &str = "transition from CANCELED to ERROR";

/// Lifecycle state of an operation, as tracked by the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Submitted,
    Running,
    Available,
    Failed,
    Expired,
}

impl From<BackendOperationState> for OperationState {
    fn from(state: BackendOperationState) -> Self {
        match state {
            BackendOperationState::Initialized | BackendOperationState::Pending => Self::Submitted,
            BackendOperationState::Running => Self::Running,
            BackendOperationState::Finished => Self::Available,
            BackendOperationState::Canceled
            | BackendOperationState::Error
            | BackendOperationState::Unknown => Self::Failed,
            BackendOperationState::Closed => Self::Expired,
        }
    }
}

impl OperationState {
    /// Failed and expired operations will never produce results.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::Expired)
    }
}

/// Status reported to the UI while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Running,
    Available,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Available => "available",
        }
    }
}

/// Maps a driver fault to the error returned to callers.
pub fn classify_fault(fault: BackendFault) -> ConnectorError {
    match fault {
        BackendFault::Structured(message) => {
            if message.contains(TIMED_OUT) {
                ConnectorError::OperationTimeout(message)
            } else {
                ConnectorError::query(message)
            }
        }
        BackendFault::Session(message) => {
            if INVALID_HANDLE_MARKERS
                .iter()
                .any(|marker| message.contains(marker))
            {
                ConnectorError::QueryExpired(message)
            } else {
                ConnectorError::query(message)
            }
        }
    }
}

/// Maps a polled operation status to what the UI should do next.
///
/// Failed operations become errors; a cancellation that Hive reports as an
/// error is treated as expired.
pub fn classify_status(status: &OperationStatus) -> Result<QueryStatus> {
    let state = OperationState::from(status.state);

    if state.is_error() {
        let message = status.error_message.clone().unwrap_or_default();
        if message.contains(CANCELED_TO_ERROR) {
            return Err(ConnectorError::expired(message));
        }
        return Err(ConnectorError::query(message));
    }

    Ok(match state {
        OperationState::Running | OperationState::Submitted => QueryStatus::Running,
        _ => QueryStatus::Available,
    })
}
