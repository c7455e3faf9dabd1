//! Statement submission and outcome classification.

pub mod classify;
pub mod executor;

pub use classify::{classify_fault, classify_status, OperationState, QueryStatus};
pub use executor::{
    ExecuteResponse, ExplainResponse, ExportDestination, ExportStatement, QueryExecutor,
};
