//! Backend driver abstraction.
//!
//! The wire client to the query server is an external collaborator. This
//! module defines the capability set the connector needs from it, the
//! engines it can be asked for, and a gateway resolving one to the other.

mod mock;
mod types;

pub use mock::{MockJobLogs, MockQueryServer};
pub use types::{
    BackendOperationState, BackendSession, ColumnMeta, Explanation, FetchedRows, OperationStatus,
    QueryRequest,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BackendFault, ConnectorError, Result};
use crate::handle::OperationHandle;

/// Result type of driver calls.
pub type DriverResult<T> = std::result::Result<T, BackendFault>;

/// Query engines a snippet can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Hive,
    Impala,
    SparkSql,
}

impl Engine {
    /// Returns the engine name used by snippets.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hive => "hive",
            Self::Impala => "impala",
            Self::SparkSql => "sparksql",
        }
    }

    /// Parses an engine from a snippet type.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hive" => Some(Self::Hive),
            "impala" => Some(Self::Impala),
            "sparksql" => Some(Self::SparkSql),
            _ => None,
        }
    }

    /// Name of the query server (and of the session application) backing
    /// this engine.
    pub fn server_name(&self) -> &'static str {
        match self {
            Self::Hive => "beeswax",
            Self::Impala => "impala",
            Self::SparkSql => "sparksql",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user on whose behalf operations run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_superuser: false,
        }
    }

    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_superuser: true,
        }
    }
}

/// Capabilities of a query server driver.
///
/// Calls are request/response; long-running work is observed by polling
/// [`QueryServerDriver::get_operation_status`].
#[async_trait]
pub trait QueryServerDriver: Send + Sync {
    /// Opens a new server session for the user.
    async fn open_session(&self, user: &User) -> DriverResult<BackendSession>;

    /// Closes a server session, returning its final record.
    async fn close_session(&self, session: &BackendSession) -> DriverResult<BackendSession>;

    /// Submits a statement and returns the handle of the new operation.
    async fn query(&self, request: &QueryRequest) -> DriverResult<OperationHandle>;

    /// Polls the state of an operation.
    async fn get_operation_status(&self, handle: &OperationHandle)
        -> DriverResult<OperationStatus>;

    /// Fetches up to `rows` rows, optionally rewinding to the first one.
    async fn fetch(
        &self,
        handle: &OperationHandle,
        start_over: bool,
        rows: usize,
    ) -> DriverResult<FetchedRows>;

    async fn cancel_operation(&self, handle: &OperationHandle) -> DriverResult<()>;

    async fn close_operation(&self, handle: &OperationHandle) -> DriverResult<()>;

    /// Switches the session's current database.
    async fn use_database(&self, database: &str) -> DriverResult<()>;

    /// Returns the operation log, from the beginning when `start_over` is set.
    async fn get_log(&self, handle: &OperationHandle, start_over: bool) -> DriverResult<String>;

    async fn explain(&self, request: &QueryRequest) -> DriverResult<Explanation>;
}

/// Resolves the driver serving an engine for a user.
pub trait DriverGateway: Send + Sync {
    fn driver(&self, user: &User, engine: Engine) -> Result<Arc<dyn QueryServerDriver>>;
}

/// Gateway over a fixed set of drivers, one per engine.
#[derive(Default, Clone)]
pub struct StaticGateway {
    drivers: HashMap<Engine, Arc<dyn QueryServerDriver>>,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the driver serving `engine`.
    pub fn with_driver(mut self, engine: Engine, driver: Arc<dyn QueryServerDriver>) -> Self {
        self.drivers.insert(engine, driver);
        self
    }
}

impl DriverGateway for StaticGateway {
    fn driver(&self, _user: &User, engine: Engine) -> Result<Arc<dyn QueryServerDriver>> {
        self.drivers.get(&engine).cloned().ok_or_else(|| {
            ConnectorError::not_supported(format!("{} interface is not enabled", engine))
        })
    }
}
