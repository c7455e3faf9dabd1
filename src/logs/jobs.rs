//! Sub-jobs launched by a Hive query, as announced in its log.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::warn;

use crate::driver::Engine;
use crate::session::properties::{property_group, Setting, SETTINGS};
use crate::snippet::{Notebook, Snippet};

/// Hive setting selecting the execution engine.
pub const EXECUTION_ENGINE_SETTING: &str = "hive.execution.engine";

static MR_JOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Starting Job = ([a-z0-9_]+?),").expect("valid regex"));
static SPARK_APPLICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Running with YARN Application = (application_\d+_\d+)").expect("valid regex")
});
static TEZ_APPLICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Executing on YARN cluster with App id ([a-z0-9_]+?)\)").expect("valid regex")
});

/// Engine Hive compiles queries for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HiveExecutionEngine {
    #[default]
    Mr,
    Spark,
    Tez,
    Other(String),
}

impl HiveExecutionEngine {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mr" => Self::Mr,
            "spark" => Self::Spark,
            "tez" => Self::Tez,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Mr => "mr",
            Self::Spark => "spark",
            Self::Tez => "tez",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for HiveExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads `hive.execution.engine` from the snippet settings, or from the
/// notebook's Hive session when the snippet has none.
pub fn resolve_execution_engine(notebook: &Notebook, snippet: &Snippet) -> HiveExecutionEngine {
    let settings: Vec<Setting> = if !snippet.properties.settings.is_empty() {
        snippet.properties.settings.clone()
    } else {
        match notebook.session(Engine::Hive) {
            Some(session) => property_group(&session.properties, SETTINGS),
            None => {
                warn!("Failed to find an active Hive session, assuming the default execution engine");
                Vec::new()
            }
        }
    };

    settings
        .iter()
        .find(|setting| setting.key == EXECUTION_ENGINE_SETTING)
        .map(|setting| HiveExecutionEngine::parse(&setting.value))
        .unwrap_or_default()
}

/// A job found in a log, with what the log says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedJob {
    pub job_id: String,
    pub started: bool,
    pub finished: bool,
}

/// Extracts sub-jobs from a query log.
pub trait JobLogParser: Send + Sync {
    fn parse_jobs(&self, logs: &str, engine: &HiveExecutionEngine) -> Vec<ParsedJob>;
}

/// Parser for the job announcements HiveServer2 writes to operation logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct HiveJobLogParser;

impl JobLogParser for HiveJobLogParser {
    fn parse_jobs(&self, logs: &str, engine: &HiveExecutionEngine) -> Vec<ParsedJob> {
        let pattern: &Regex = match engine {
            HiveExecutionEngine::Mr => &MR_JOB_RE,
            HiveExecutionEngine::Spark => &SPARK_APPLICATION_RE,
            HiveExecutionEngine::Tez => &TEZ_APPLICATION_RE,
            HiveExecutionEngine::Other(_) => return Vec::new(),
        };

        let mut jobs: Vec<ParsedJob> = Vec::new();
        for caps in pattern.captures_iter(logs) {
            let job_id = &caps[1];
            if jobs.iter().any(|job| job.job_id == job_id) {
                continue;
            }
            jobs.push(ParsedJob {
                job_id: job_id.to_string(),
                started: true,
                finished: logs.contains(&format!("Ended Job = {job_id}")),
            });
        }
        jobs
    }
}

/// A sub-job as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub url: String,
    pub started: bool,
    pub finished: bool,
}

/// Lists the sub-jobs of a query. Only Hive reports jobs.
pub fn get_jobs(
    engine: Engine,
    execution_engine: &HiveExecutionEngine,
    logs: &str,
    parser: &dyn JobLogParser,
    job_browser_url: &str,
) -> Vec<Job> {
    if engine != Engine::Hive {
        return Vec::new();
    }

    parser
        .parse_jobs(logs, execution_engine)
        .into_iter()
        .map(|job| Job {
            url: job_url(job_browser_url, &job.job_id),
            name: job.job_id,
            started: job.started,
            finished: job.finished,
        })
        .collect()
}

fn job_url(base: &str, job_id: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), job_id)
}
