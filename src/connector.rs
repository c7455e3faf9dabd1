//! Notebook-facing entry point.
//!
//! [`HiveServerConnector`] is what the notebook calls. It resolves the driver
//! for a snippet's engine, decodes the snippet's handle and hands off to the
//! session, query and log components. It keeps no per-query state: the
//! caller stores the handle document returned by [`HiveServerConnector::execute`]
//! and passes it back inside the snippet.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::driver::{ColumnMeta, DriverGateway, Engine, QueryServerDriver, User};
use crate::error::Result;
use crate::handle::{self, OperationHandle};
use crate::logs::{
    self, ensure_applicable, resolve_execution_engine, HiveJobLogParser, Job, JobLogParser,
    JobLogSource, ResultSize, ResultSizeExtractor, RetryPolicy,
};
use crate::query::{
    classify_status, ExecuteResponse, ExplainResponse, ExportStatement, QueryExecutor,
    QueryStatus,
};
use crate::session::properties::{self, Property};
use crate::session::{
    CloseSessionResponse, DefaultConfigurationSource, Session, SessionManager, SessionRef,
    SessionStore, STATUS_OK, STATUS_SKIPPED,
};
use crate::snippet::{Notebook, Snippet};

/// Result of polling a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatusResponse {
    pub status: QueryStatus,
}

/// Bare status code answer (`0` done, `-1` skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: i32,
}

/// A page of results in the shape the notebook renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub has_more: bool,
    pub data: Vec<Vec<Value>>,
    pub meta: Vec<ColumnMeta>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Connector for HiveServer2-compatible engines (Hive, Impala, SparkSQL).
pub struct HiveServerConnector {
    gateway: Arc<dyn DriverGateway>,
    sessions: Arc<dyn SessionStore>,
    defaults: Option<Arc<dyn DefaultConfigurationSource>>,
    job_logs: Option<Arc<dyn JobLogSource>>,
    job_parser: Arc<dyn JobLogParser>,
    config: Config,
    user: User,
}

impl HiveServerConnector {
    pub fn new(
        gateway: Arc<dyn DriverGateway>,
        sessions: Arc<dyn SessionStore>,
        config: Config,
        user: User,
    ) -> Self {
        Self {
            gateway,
            sessions,
            defaults: None,
            job_logs: None,
            job_parser: Arc::new(HiveJobLogParser),
            config,
            user,
        }
    }

    /// Source of per-user default session properties.
    pub fn with_default_configuration(
        mut self,
        defaults: Arc<dyn DefaultConfigurationSource>,
    ) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Source of task logs, needed to count MapReduce result rows.
    pub fn with_job_logs(mut self, job_logs: Arc<dyn JobLogSource>) -> Self {
        self.job_logs = Some(job_logs);
        self
    }

    pub fn with_job_parser(mut self, parser: Arc<dyn JobLogParser>) -> Self {
        self.job_parser = parser;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    fn driver(&self, engine: Engine) -> Result<Arc<dyn QueryServerDriver>> {
        self.gateway.driver(&self.user, engine)
    }

    /// Resolves the driver and backend handle a snippet refers to.
    fn operation(&self, snippet: &Snippet) -> Result<(Arc<dyn QueryServerDriver>, OperationHandle)> {
        let driver = self.driver(snippet.engine)?;
        let operation = handle::decode(snippet.handle())?;
        Ok((driver, operation))
    }

    // === Sessions ===

    /// Returns the user's session for `engine`, opening one if needed.
    pub async fn create_session(
        &self,
        engine: Engine,
        properties: Option<Vec<Property>>,
    ) -> Result<Session> {
        let driver = self.driver(engine)?;
        SessionManager::new(
            driver.as_ref(),
            self.sessions.as_ref(),
            self.defaults.as_deref(),
            &self.config,
            &self.user,
        )
        .create_session(engine, properties)
        .await
    }

    pub async fn close_session(&self, session: &SessionRef) -> Result<CloseSessionResponse> {
        let driver = self.driver(session.engine)?;
        SessionManager::new(
            driver.as_ref(),
            self.sessions.as_ref(),
            self.defaults.as_deref(),
            &self.config,
            &self.user,
        )
        .close_session(session)
        .await
    }

    // === Execution ===

    /// Submits the next statement of the snippet's script.
    pub async fn execute(&self, notebook: &Notebook, snippet: &Snippet) -> Result<ExecuteResponse> {
        let driver = self.driver(snippet.engine)?;
        QueryExecutor::new(driver.as_ref(), &self.config)
            .execute(notebook, snippet)
            .await
    }

    /// Polls the snippet's operation.
    pub async fn check_status(&self, snippet: &Snippet) -> Result<CheckStatusResponse> {
        let (driver, operation) = self.operation(snippet)?;
        let status = driver.get_operation_status(&operation).await?;
        debug!(engine = %snippet.engine, state = ?status.state, "Polled operation");

        Ok(CheckStatusResponse {
            status: classify_status(&status)?,
        })
    }

    /// Fetches up to `rows` result rows.
    pub async fn fetch_result(
        &self,
        snippet: &Snippet,
        rows: usize,
        start_over: bool,
    ) -> Result<FetchResponse> {
        let (driver, operation) = self.operation(snippet)?;
        let page = driver.fetch(&operation, start_over, rows).await?;

        Ok(FetchResponse {
            has_more: page.has_more,
            data: page.rows,
            meta: page.columns,
            kind: "table".to_string(),
        })
    }

    pub async fn cancel(&self, snippet: &Snippet) -> Result<StatusResponse> {
        let (driver, operation) = self.operation(snippet)?;
        driver.cancel_operation(&operation).await?;
        Ok(StatusResponse { status: STATUS_OK })
    }

    /// Returns the operation log; `start_from == Some(0)` rereads it from
    /// the beginning.
    pub async fn get_log(&self, snippet: &Snippet, start_from: Option<u64>) -> Result<String> {
        let (driver, operation) = self.operation(snippet)?;
        Ok(driver.get_log(&operation, start_from == Some(0)).await?)
    }

    /// Releases the snippet's operation unless the engine keeps queries open.
    pub async fn close_statement(&self, snippet: &Snippet) -> Result<StatusResponse> {
        if !self.config.close_queries(snippet.engine) {
            return Ok(StatusResponse {
                status: STATUS_SKIPPED,
            });
        }

        let (driver, operation) = self.operation(snippet)?;
        driver.close_operation(&operation).await?;
        Ok(StatusResponse { status: STATUS_OK })
    }

    pub async fn explain(&self, notebook: &Notebook, snippet: &Snippet) -> Result<ExplainResponse> {
        let driver = self.driver(snippet.engine)?;
        QueryExecutor::new(driver.as_ref(), &self.config)
            .explain(notebook, snippet)
            .await
    }

    pub async fn export_data_as_table(
        &self,
        notebook: &Notebook,
        snippet: &Snippet,
        destination: &str,
        is_temporary: bool,
        location: Option<&str>,
    ) -> Result<ExportStatement> {
        let driver = self.driver(snippet.engine)?;
        QueryExecutor::new(driver.as_ref(), &self.config)
            .export_data_as_table(notebook, snippet, destination, is_temporary, location)
            .await
    }

    pub async fn export_large_data_to_hdfs(
        &self,
        notebook: &Notebook,
        snippet: &Snippet,
        destination: &str,
    ) -> Result<ExportStatement> {
        let driver = self.driver(snippet.engine)?;
        QueryExecutor::new(driver.as_ref(), &self.config)
            .export_large_data_to_hdfs(notebook, snippet, destination)
            .await
    }

    // === Logs ===

    pub fn progress(&self, snippet: &Snippet, logs: &str) -> u32 {
        logs::progress(snippet.engine, logs)
    }

    pub fn get_jobs(&self, notebook: &Notebook, snippet: &Snippet, logs: &str) -> Vec<Job> {
        if snippet.engine != Engine::Hive {
            return Vec::new();
        }
        let execution_engine = resolve_execution_engine(notebook, snippet);
        logs::get_jobs(
            snippet.engine,
            &execution_engine,
            logs,
            self.job_parser.as_ref(),
            &self.config.job_browser_url,
        )
    }

    /// Row count (and size, when known) of a finished Hive query.
    ///
    /// Waiting for task logs stops after `deadline`.
    pub async fn fetch_result_size(
        &self,
        notebook: &Notebook,
        snippet: &Snippet,
        deadline: Duration,
    ) -> Result<ResultSize> {
        ensure_applicable(snippet.engine, snippet.status.as_deref())?;

        let (driver, operation) = self.operation(snippet)?;
        let logs = driver.get_log(&operation, true).await?;

        let execution_engine = resolve_execution_engine(notebook, snippet);
        let jobs = logs::get_jobs(
            snippet.engine,
            &execution_engine,
            &logs,
            self.job_parser.as_ref(),
            &self.config.job_browser_url,
        );

        ResultSizeExtractor::new(
            self.job_logs.as_deref(),
            RetryPolicy::from(&self.config.task_log),
        )
        .extract(&execution_engine, &logs, &jobs, deadline)
        .await
    }

    // === Properties ===

    /// Built-in session property schema for `engine`.
    pub fn get_properties(&self, engine: Engine) -> Vec<Property> {
        properties::default_properties(engine, self.config.settings_whitelist(engine))
    }

    pub fn upgrade_properties(&self, engine: Engine, current: &Value) -> Vec<Property> {
        properties::upgrade_properties(engine, current, self.config.settings_whitelist(engine))
    }
}
