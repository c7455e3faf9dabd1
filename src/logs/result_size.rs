//! Result row counts and sizes recovered from job logs.
//!
//! HiveServer2 does not report how many rows a query produced. MapReduce
//! jobs write the count to the syslog of their last task, which may only be
//! readable once the job history server has archived it. Spark jobs print
//! both the count and the byte size to the operation log itself.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

use super::jobs::{HiveExecutionEngine, Job};
use crate::config::TaskLogConfig;
use crate::driver::Engine;
use crate::error::{ConnectorError, Result};
use crate::query::classify::QueryStatus;

/// Prefix of the answer given for a task log that is not archived yet.
const NOT_ARCHIVED_YET: &str = "Unable to locate";

static MR_RECORDS_OUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"org\.apache\.hadoop\.hive\.ql\.exec\.FileSinkOperator: RECORDS_OUT_0:(\d+)")
        .expect("valid regex")
});
static SPARK_RECORDS_OUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RECORDS_OUT_0: (\d+)").expect("valid regex"));
static SPARK_RESULT_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Spark Job\[[a-z0-9-]+\] Metrics[A-Za-z0-9:\s]+ResultSize: (\d+)")
        .expect("valid regex")
});

/// Source of the syslog of a job's last task.
#[async_trait]
pub trait JobLogSource: Send + Sync {
    /// Returns the task log, or `None` when it cannot be read right now.
    async fn fetch_task_log(&self, job_id: &str) -> Result<Option<String>>;
}

/// Number of rows and bytes a query produced, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSize {
    pub rows: Option<u64>,
    pub size: Option<u64>,
    pub message: String,
}

/// How often and how long to wait for a task log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl From<&TaskLogConfig> for RetryPolicy {
    fn from(config: &TaskLogConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: config.retry_interval(),
        }
    }
}

/// Result sizes are only known for finished Hive queries.
pub fn ensure_applicable(engine: Engine, status: Option<&str>) -> Result<()> {
    if status != Some(QueryStatus::Available.as_str()) {
        return Err(ConnectorError::query("Result status is not available"));
    }
    if engine != Engine::Hive {
        return Err(ConnectorError::not_supported(format!(
            "Cannot retrieve result size for dialect \"{engine}\""
        )));
    }
    Ok(())
}

/// Reads a task log, retrying while it is missing or not archived yet.
///
/// Returns `Ok(None)` once `policy.max_attempts` reads came back empty.
pub async fn fetch_task_syslog(
    source: &dyn JobLogSource,
    job_id: &str,
    policy: RetryPolicy,
) -> Result<Option<String>> {
    for attempt in 1..=policy.max_attempts {
        match source.fetch_task_log(job_id).await? {
            Some(log) if !log.starts_with(NOT_ARCHIVED_YET) => return Ok(Some(log)),
            Some(_) => debug!(job_id, attempt, "Task log not archived yet"),
            None => debug!(job_id, attempt, "Task log not found"),
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Ok(None)
}

/// Extracts result sizes for one execution engine.
pub struct ResultSizeExtractor<'a> {
    job_logs: Option<&'a dyn JobLogSource>,
    policy: RetryPolicy,
}

impl<'a> ResultSizeExtractor<'a> {
    pub fn new(job_logs: Option<&'a dyn JobLogSource>, policy: RetryPolicy) -> Self {
        Self { job_logs, policy }
    }

    /// Computes the result size of a finished query.
    ///
    /// `deadline` bounds the whole task log wait; exceeding it is an
    /// [`ConnectorError::OperationTimeout`].
    pub async fn extract(
        &self,
        execution_engine: &HiveExecutionEngine,
        logs: &str,
        jobs: &[Job],
        deadline: Duration,
    ) -> Result<ResultSize> {
        match execution_engine {
            HiveExecutionEngine::Mr => self.from_task_log(jobs, deadline).await,
            HiveExecutionEngine::Spark => Ok(ResultSize {
                rows: capture_number(&SPARK_RECORDS_OUT_RE, logs),
                size: capture_number(&SPARK_RESULT_SIZE_RE, logs),
                message: String::new(),
            }),
            _ => Ok(ResultSize::default()),
        }
    }

    async fn from_task_log(&self, jobs: &[Job], deadline: Duration) -> Result<ResultSize> {
        let Some(last_job) = jobs.last() else {
            return Ok(ResultSize {
                message: "Hive query did not execute any jobs.".to_string(),
                ..ResultSize::default()
            });
        };
        info!(
            "Hive query executed {} jobs, last job is: {}",
            jobs.len(),
            last_job.name
        );

        let source = self
            .job_logs
            .ok_or_else(|| ConnectorError::not_supported("Task logs are not available"))?;

        let syslog = tokio::time::timeout(
            deadline,
            fetch_task_syslog(source, &last_job.name, self.policy),
        )
        .await
        .map_err(|_| {
            ConnectorError::timeout(format!(
                "Gave up waiting for the task log of job {}",
                last_job.name
            ))
        })??
        .ok_or_else(|| {
            ConnectorError::query(format!(
                "Failed to get task syslog for Hive query with job: {}",
                last_job.name
            ))
        })?;

        Ok(ResultSize {
            rows: capture_number(&MR_RECORDS_OUT_RE, &syslog),
            size: None,
            message: String::new(),
        })
    }
}

fn capture_number(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}
