//! Statement submission.
//!
//! Turns a snippet into a submitted operation: pick the statement to run,
//! resolve its properties against the notebook session, switch database on
//! the first statement of a script and submit.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::driver::{DriverResult, QueryRequest, QueryServerDriver};
use crate::error::{BackendFault, ConnectorError, Result};
use crate::handle::{self, EncodedHandle, HandleDocument, OperationHandle};
use crate::session::Session;
use crate::snippet::{Notebook, Snippet};
use crate::statement::{next_statement, CurrentStatement, MultiStatementState};

/// Handle of a submitted statement plus its place in the script.
///
/// Serialized flat, this is the document the caller stores as the snippet's
/// result handle and sends back on later calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(flatten)]
    pub handle: EncodedHandle,
    #[serde(flatten)]
    pub statement: CurrentStatement,
}

impl ExecuteResponse {
    /// Flattens the response into a handle document.
    pub fn to_document(&self) -> Result<HandleDocument> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(document)) => Ok(document),
            Ok(_) => Err(ConnectorError::malformed_handle(
                "handle did not serialize to an object",
            )),
            Err(e) => Err(ConnectorError::malformed_handle(e.to_string())),
        }
    }
}

/// Plan of the current statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub status: i32,
    pub explanation: String,
    pub statement: String,
}

/// Where an export statement writes its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExportDestination {
    Table { database: String, table: String },
    Directory { path: String },
}

/// A statement that exports the current query's results, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatement {
    pub hql: String,
    pub destination: ExportDestination,
}

/// Submits snippet statements through one driver.
pub struct QueryExecutor<'a> {
    driver: &'a dyn QueryServerDriver,
    config: &'a Config,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(driver: &'a dyn QueryServerDriver, config: &'a Config) -> Self {
        Self { driver, config }
    }

    /// Submits the next statement of the snippet's script.
    pub async fn execute(&self, notebook: &Notebook, snippet: &Snippet) -> Result<ExecuteResponse> {
        let current = self.current_statement(snippet).await?;
        let request = self.prepare_query(
            snippet,
            &current.statement.text,
            notebook.session(snippet.engine),
        );

        debug!(
            engine = %snippet.engine,
            statement_id = current.state.statement_id,
            statements_count = current.state.statements_count,
            database = %request.database,
            "Submitting statement"
        );

        match self.submit(&request, current.is_first()).await {
            Ok(operation) => Ok(ExecuteResponse {
                handle: handle::encode(&operation),
                statement: current,
            }),
            Err(BackendFault::Session(message)) => {
                Err(ConnectorError::statement_failed(message, current))
            }
            Err(fault) => Err(fault.into()),
        }
    }

    async fn submit(
        &self,
        request: &QueryRequest,
        first_statement: bool,
    ) -> DriverResult<OperationHandle> {
        // Some servers bind the database to the session rather than the statement.
        if first_statement {
            self.driver.use_database(&request.database).await?;
        }
        self.driver.query(request).await
    }

    /// Picks the statement to run, closing the previous statement's
    /// operation when the script is being continued.
    pub async fn current_statement(&self, snippet: &Snippet) -> Result<CurrentStatement> {
        let previous = MultiStatementState::from_handle(snippet.handle());
        if previous.has_more_statements {
            self.close_previous(snippet.handle()).await;
        }
        next_statement(&previous, &snippet.statement)
    }

    async fn close_previous(&self, document: &HandleDocument) {
        let operation = match handle::decode(document) {
            Ok(operation) => operation,
            Err(e) => {
                warn!("Could not close previous multi-statement query: {e}");
                return;
            }
        };
        if let Err(e) = self.driver.close_operation(&operation).await {
            warn!("Could not close previous multi-statement query: {e}");
        }
    }

    /// Builds the request for `statement`, merging snippet properties over
    /// the session's.
    pub fn prepare_query(
        &self,
        snippet: &Snippet,
        statement: &str,
        session: Option<&Session>,
    ) -> QueryRequest {
        let session_properties = session.map(|s| s.properties.as_slice()).unwrap_or_default();
        let properties = snippet.properties.merge_with_session(session_properties);

        QueryRequest {
            statement: statement.to_string(),
            settings: properties.settings,
            file_resources: properties.files,
            functions: properties.functions,
            database: snippet
                .database_or(&self.config.default_database)
                .to_string(),
        }
    }

    /// Asks the server for the plan of the current statement.
    pub async fn explain(&self, notebook: &Notebook, snippet: &Snippet) -> Result<ExplainResponse> {
        let current = self.current_statement(snippet).await?;
        let request = self.prepare_query(
            snippet,
            &current.statement.text,
            notebook.session(snippet.engine),
        );

        let explanation = self.driver.explain(&request).await.map_err(rejected)?;

        Ok(ExplainResponse {
            status: 0,
            explanation: explanation.textual,
            statement: request.statement,
        })
    }

    /// Builds a `CREATE TABLE ... AS` statement saving the current query's
    /// results into `destination` (`table` or `database.table`).
    pub async fn export_data_as_table(
        &self,
        notebook: &Notebook,
        snippet: &Snippet,
        destination: &str,
        is_temporary: bool,
        location: Option<&str>,
    ) -> Result<ExportStatement> {
        let request = self.exportable_query(notebook, snippet).await?;

        let (database, table) = match destination.split_once('.') {
            Some((database, table)) => (database.to_string(), table.to_string()),
            None => (
                snippet
                    .database_or(&self.config.default_database)
                    .to_string(),
                destination.to_string(),
            ),
        };

        self.driver.use_database(&request.database).await?;

        let hql = format!(
            "CREATE {}TABLE `{}`.`{}` {}AS {}",
            if is_temporary { "TEMPORARY " } else { "" },
            database,
            table,
            location
                .map(|location| format!("LOCATION '{location}' "))
                .unwrap_or_default(),
            request.statement
        );

        Ok(ExportStatement {
            hql,
            destination: ExportDestination::Table { database, table },
        })
    }

    /// Builds an `INSERT OVERWRITE DIRECTORY` statement writing the current
    /// query's results to `destination`.
    pub async fn export_large_data_to_hdfs(
        &self,
        notebook: &Notebook,
        snippet: &Snippet,
        destination: &str,
    ) -> Result<ExportStatement> {
        let request = self.exportable_query(notebook, snippet).await?;

        self.driver.use_database(&request.database).await?;

        Ok(ExportStatement {
            hql: format!(
                "INSERT OVERWRITE DIRECTORY '{}' {}",
                destination, request.statement
            ),
            destination: ExportDestination::Directory {
                path: destination.to_string(),
            },
        })
    }

    async fn exportable_query(&self, notebook: &Notebook, snippet: &Snippet) -> Result<QueryRequest> {
        let current = self.current_statement(snippet).await?;
        let request = self.prepare_query(
            snippet,
            &current.statement.text,
            notebook.session(snippet.engine),
        );

        if !request.statement.to_lowercase().contains("select") {
            return Err(ConnectorError::query(format!(
                "Only SELECT statements can be saved. Provided statement: {}",
                request.statement
            )));
        }
        Ok(request)
    }
}

/// Session faults raised while compiling a statement are plain query errors.
fn rejected(fault: BackendFault) -> ConnectorError {
    match fault {
        BackendFault::Session(message) => ConnectorError::query(message),
        other => other.into(),
    }
}
