//! Multi-statement continuation.
//!
//! The position inside a script is not kept anywhere in the process: it
//! travels in the caller-held handle document and comes back on the next
//! call, where [`next_statement`] decides which statement runs next.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{split_statements, Statement};
use crate::error::{ConnectorError, Result};
use crate::handle::HandleDocument;

/// Position of the running statement within its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiStatementState {
    pub statement_id: usize,
    pub statements_count: usize,
    pub has_more_statements: bool,
}

impl Default for MultiStatementState {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl MultiStatementState {
    /// Creates a state, deriving `has_more_statements` from the position.
    pub fn new(statement_id: usize, statements_count: usize) -> Self {
        Self {
            statement_id,
            statements_count,
            has_more_statements: statement_id.saturating_add(1) < statements_count,
        }
    }

    /// Reads the state carried by a handle document, using defaults for
    /// missing fields (a fresh document has none of them).
    pub fn from_handle(handle: &HandleDocument) -> Self {
        let read_usize = |key: &str| {
            handle
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| usize::try_from(v).ok())
        };

        Self {
            statement_id: read_usize("statement_id").unwrap_or(0),
            statements_count: read_usize("statements_count").unwrap_or(1),
            has_more_statements: handle
                .get("has_more_statements")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// The statement selected for execution and where it sits in its script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStatement {
    #[serde(flatten)]
    pub state: MultiStatementState,
    #[serde(flatten)]
    pub statement: Statement,
}

impl CurrentStatement {
    pub fn is_first(&self) -> bool {
        self.state.statement_id == 0
    }
}

/// Picks the statement to run given the state of the previous call.
///
/// The script is split again on every call since the user may have edited
/// it. When the number of statements no longer matches the previous call the
/// script restarts from its first statement.
pub fn next_statement(previous: &MultiStatementState, script: &str) -> Result<CurrentStatement> {
    let mut statement_id = if previous.has_more_statements {
        previous.statement_id.saturating_add(1)
    } else {
        0
    };

    let mut statements = split_statements(script);
    let statements_count = statements.len();
    if statements_count == 0 {
        return Err(ConnectorError::query("There is no statement to execute."));
    }

    if statements_count != previous.statements_count {
        debug!(
            previous = previous.statements_count,
            current = statements_count,
            "Statement count changed, restarting script"
        );
        statement_id = 0;
    }

    if statement_id >= statements_count {
        statement_id = 0;
    }

    let statement = statements.swap_remove(statement_id);
    Ok(CurrentStatement {
        state: MultiStatementState::new(statement_id, statements_count),
        statement,
    })
}
