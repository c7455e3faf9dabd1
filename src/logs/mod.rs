//! Information derived from query logs: progress, sub-jobs and result sizes.

pub mod jobs;
pub mod progress;
pub mod result_size;

pub use jobs::{
    get_jobs, resolve_execution_engine, HiveExecutionEngine, HiveJobLogParser, Job, JobLogParser,
    ParsedJob,
};
pub use progress::progress;
pub use result_size::{
    ensure_applicable, fetch_task_syslog, JobLogSource, ResultSize, ResultSizeExtractor,
    RetryPolicy,
};
