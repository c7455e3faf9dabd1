//! Completion estimates from engine logs.

use regex::Regex;
use std::sync::LazyLock;

use crate::driver::Engine;

/// Hive never reports less than this once a query is submitted.
pub const MIN_HIVE_PROGRESS: u32 = 5;

/// Engines whose logs carry no progress information.
const UNKNOWN_PROGRESS: u32 = 50;

static TOTAL_JOBS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total jobs = (\d+)").expect("valid regex"));
static PERCENT_COMPLETE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)% Complete").expect("valid regex"));

/// Estimates the completion percentage (0 to 100) of a query from its log.
pub fn progress(engine: Engine, logs: &str) -> u32 {
    match engine {
        Engine::Hive => hive_progress(logs),
        Engine::Impala => impala_progress(logs),
        Engine::SparkSql => UNKNOWN_PROGRESS,
    }
}

/// Each job contributes a start and an end marker.
fn hive_progress(logs: &str) -> u32 {
    let total = TOTAL_JOBS_RE
        .captures(logs)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .filter(|total| *total > 0)
        .unwrap_or(1);

    let started = logs.matches("Starting Job").count() as u64;
    let ended = logs.matches("Ended Job").count() as u64;

    // A total too large to double counts as a single job.
    let markers = total.checked_mul(2).unwrap_or(2);
    let percent = started.saturating_add(ended).saturating_mul(100) / markers;
    percent.clamp(u64::from(MIN_HIVE_PROGRESS), 100) as u32
}

/// Impala prints a running percentage; the last one wins.
fn impala_progress(logs: &str) -> u32 {
    PERCENT_COMPLETE_RE
        .captures_iter(logs)
        .last()
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map_or(0, |percent| percent.min(100))
}
