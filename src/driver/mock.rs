//! Mock query server for testing.
//!
//! Provides an in-memory driver, session store and job log store with
//! scripted answers, recording every call so tests can assert on them.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use super::{
    BackendOperationState, BackendSession, DriverResult, Engine, Explanation, FetchedRows,
    OperationStatus, QueryRequest, QueryServerDriver, User,
};
use crate::error::{BackendFault, Result};
use crate::handle::OperationHandle;
use crate::logs::JobLogSource;
use crate::session::properties::Setting;
use crate::session::SessionStore;

#[derive(Debug, Default)]
struct MockState {
    sessions: Vec<BackendSession>,
    next_session_id: i64,
    next_operation: u32,
    session_properties: Vec<Setting>,
    statuses: VecDeque<OperationStatus>,
    log: String,
    rows: FetchedRows,
    query_fault: Option<BackendFault>,
    status_fault: Option<BackendFault>,
    close_fault: Option<BackendFault>,
    submitted: Vec<QueryRequest>,
    used_databases: Vec<String>,
    closed: Vec<OperationHandle>,
    cancelled: Vec<OperationHandle>,
}

/// In-memory query server that also acts as the session store.
#[derive(Debug)]
pub struct MockQueryServer {
    application: &'static str,
    state: Mutex<MockState>,
}

impl Default for MockQueryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockQueryServer {
    /// Creates a mock HiveServer2.
    pub fn new() -> Self {
        Self::for_engine(Engine::Hive)
    }

    /// Creates a mock server for the given engine.
    pub fn for_engine(engine: Engine) -> Self {
        Self {
            application: engine.server_name(),
            state: Mutex::new(MockState {
                next_session_id: 1,
                ..MockState::default()
            }),
        }
    }

    /// Adds an already open session.
    pub fn with_session(mut self, session: BackendSession) -> Self {
        let state = self.state.get_mut();
        state.next_session_id = state.next_session_id.max(session.id + 1);
        state.sessions.push(session);
        self
    }

    /// Properties the server reports for new sessions.
    pub fn with_session_properties(mut self, properties: Vec<Setting>) -> Self {
        self.state.get_mut().session_properties = properties;
        self
    }

    /// Statuses returned by successive polls; once exhausted, polls report
    /// `FINISHED`.
    pub fn with_statuses(mut self, statuses: Vec<OperationStatus>) -> Self {
        self.state.get_mut().statuses = statuses.into();
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.state.get_mut().log = log.into();
        self
    }

    pub fn with_rows(mut self, rows: FetchedRows) -> Self {
        self.state.get_mut().rows = rows;
        self
    }

    /// Makes every submission fail with `fault`.
    pub fn failing_query(mut self, fault: BackendFault) -> Self {
        self.state.get_mut().query_fault = Some(fault);
        self
    }

    /// Makes every status poll fail with `fault`.
    pub fn failing_status(mut self, fault: BackendFault) -> Self {
        self.state.get_mut().status_fault = Some(fault);
        self
    }

    /// Makes every operation close fail with `fault`.
    pub fn failing_close(mut self, fault: BackendFault) -> Self {
        self.state.get_mut().close_fault = Some(fault);
        self
    }

    /// Statements submitted so far.
    pub async fn submitted(&self) -> Vec<QueryRequest> {
        self.state.lock().await.submitted.clone()
    }

    /// Databases switched to so far.
    pub async fn used_databases(&self) -> Vec<String> {
        self.state.lock().await.used_databases.clone()
    }

    /// Operations closed so far.
    pub async fn closed_operations(&self) -> Vec<OperationHandle> {
        self.state.lock().await.closed.clone()
    }

    /// Operations cancelled so far.
    pub async fn cancelled_operations(&self) -> Vec<OperationHandle> {
        self.state.lock().await.cancelled.clone()
    }

    /// Sessions currently open.
    pub async fn open_sessions(&self) -> Vec<BackendSession> {
        self.state.lock().await.sessions.clone()
    }
}

#[async_trait]
impl QueryServerDriver for MockQueryServer {
    async fn open_session(&self, user: &User) -> DriverResult<BackendSession> {
        let mut state = self.state.lock().await;
        let session = BackendSession {
            id: state.next_session_id,
            application: self.application.to_string(),
            owner: user.username.clone(),
            status_code: 0,
            properties: state.session_properties.clone(),
        };
        state.next_session_id += 1;
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn close_session(&self, session: &BackendSession) -> DriverResult<BackendSession> {
        let mut state = self.state.lock().await;
        let position = state
            .sessions
            .iter()
            .position(|s| s.id == session.id)
            .ok_or_else(|| BackendFault::Session(format!("Invalid session id {}", session.id)))?;
        Ok(state.sessions.remove(position))
    }

    async fn query(&self, request: &QueryRequest) -> DriverResult<OperationHandle> {
        let mut state = self.state.lock().await;
        if let Some(fault) = &state.query_fault {
            return Err(fault.clone());
        }

        state.next_operation += 1;
        let n = state.next_operation;
        state.submitted.push(request.clone());

        let keyword = request
            .statement
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();
        Ok(OperationHandle {
            secret: format!("secret-{n}").into_bytes(),
            guid: format!("guid-{n}").into_bytes(),
            operation_type: 0,
            has_result_set: matches!(
                keyword.as_str(),
                "SELECT" | "WITH" | "SHOW" | "DESCRIBE" | "EXPLAIN"
            ),
            modified_row_count: None,
            log_context: Some(format!("mock_{n}")),
        })
    }

    async fn get_operation_status(
        &self,
        _handle: &OperationHandle,
    ) -> DriverResult<OperationStatus> {
        let mut state = self.state.lock().await;
        if let Some(fault) = &state.status_fault {
            return Err(fault.clone());
        }
        Ok(state
            .statuses
            .pop_front()
            .unwrap_or_else(|| OperationStatus::new(BackendOperationState::Finished)))
    }

    async fn fetch(
        &self,
        _handle: &OperationHandle,
        _start_over: bool,
        rows: usize,
    ) -> DriverResult<FetchedRows> {
        let state = self.state.lock().await;
        let mut page = state.rows.clone();
        if page.rows.len() > rows {
            page.rows.truncate(rows);
            page.has_more = true;
        }
        Ok(page)
    }

    async fn cancel_operation(&self, handle: &OperationHandle) -> DriverResult<()> {
        self.state.lock().await.cancelled.push(handle.clone());
        Ok(())
    }

    async fn close_operation(&self, handle: &OperationHandle) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        if let Some(fault) = &state.close_fault {
            return Err(fault.clone());
        }
        state.closed.push(handle.clone());
        Ok(())
    }

    async fn use_database(&self, database: &str) -> DriverResult<()> {
        let mut state = self.state.lock().await;
        if let Some(fault) = &state.query_fault {
            return Err(fault.clone());
        }
        state.used_databases.push(database.to_string());
        Ok(())
    }

    async fn get_log(&self, _handle: &OperationHandle, _start_over: bool) -> DriverResult<String> {
        Ok(self.state.lock().await.log.clone())
    }

    async fn explain(&self, request: &QueryRequest) -> DriverResult<Explanation> {
        let state = self.state.lock().await;
        if let Some(fault) = &state.query_fault {
            return Err(fault.clone());
        }
        Ok(Explanation {
            textual: format!(
                "STAGE DEPENDENCIES:\n  Stage-0 is a root stage\n\nPlan for: {}",
                request.statement
            ),
        })
    }
}

#[async_trait]
impl SessionStore for MockQueryServer {
    async fn find_active(&self, user: &User, application: &str) -> Result<Option<BackendSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .rev()
            .find(|s| s.owner == user.username && s.application == application)
            .cloned())
    }

    async fn find(
        &self,
        id: i64,
        application: &str,
        owner: Option<&str>,
    ) -> Result<Option<BackendSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .find(|s| {
                s.id == id
                    && s.application == application
                    && owner.map_or(true, |owner| s.owner == owner)
            })
            .cloned())
    }
}

/// Job log store answering from a script of responses.
///
/// Each fetch consumes one response; once exhausted, fetches return `None`.
#[derive(Debug, Default)]
pub struct MockJobLogs {
    responses: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<String>>,
}

impl MockJobLogs {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Job ids requested so far.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl JobLogSource for MockJobLogs {
    async fn fetch_task_log(&self, job_id: &str) -> Result<Option<String>> {
        self.requests.lock().await.push(job_id.to_string());
        Ok(self.responses.lock().await.pop_front().flatten())
    }
}
