//! Subcommands of the binary.

use super::run_cli;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

/// Config file that does not exist, so runs never pick up a user config.
const NO_CONFIG: &str = "/nonexistent/hs2-notebook/config.toml";

#[test]
fn test_split_from_stdin() {
    let (code, stdout, _) = run_cli(
        &["split", "--config", NO_CONFIG, "-"],
        "SELECT 'a;b';\n-- note\nSHOW TABLES;",
    );

    assert_eq!(code, 0);
    let statements: Value = serde_json::from_str(&stdout).unwrap();
    let texts: Vec<&str> = statements
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["statement"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["SELECT 'a;b'", "-- note\nSHOW TABLES"]);
}

#[test]
fn test_progress_from_file() {
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "Query 7f: 35% Complete (7 out of 20)").unwrap();

    let (code, stdout, _) = run_cli(
        &[
            "progress",
            "--engine",
            "impala",
            "--config",
            NO_CONFIG,
            log.path().to_str().unwrap(),
        ],
        "",
    );

    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "35");
}

#[test]
fn test_jobs_use_configured_job_browser() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "job_browser_url = \"https://hue.example.com/jobbrowser/jobs\"").unwrap();

    let (code, stdout, _) = run_cli(
        &["jobs", "--config", config.path().to_str().unwrap(), "-"],
        "Starting Job = job_1709280000000_0007, Tracking URL = http://rm/\n",
    );

    assert_eq!(code, 0);
    let jobs: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(jobs[0]["name"], "job_1709280000000_0007");
    assert_eq!(
        jobs[0]["url"],
        "https://hue.example.com/jobbrowser/jobs/job_1709280000000_0007"
    );
    assert_eq!(jobs[0]["finished"], false);
}

#[test]
fn test_result_size_from_spark_log() {
    let (code, stdout, _) = run_cli(
        &["result-size", "--config", NO_CONFIG, "-"],
        "RECORDS_OUT_0: 12\nSpark Job[ab-1] Metrics\n  ResultSize: 640\n",
    );

    assert_eq!(code, 0);
    let size: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(size["rows"], 12);
    assert_eq!(size["size"], 640);
}

#[test]
fn test_simulate_runs_every_statement() {
    let (code, stdout, _) = run_cli(
        &["simulate", "--config", NO_CONFIG, "-"],
        "USE sales;\nSELECT 1;\nSELECT 2",
    );

    assert_eq!(code, 0);
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["statement"]["statement_id"], 0);
    assert_eq!(lines[2]["statement"]["has_more_statements"], false);
    assert!(lines.iter().all(|line| line["status"] == "available"));
}

#[test]
fn test_invalid_config_fails() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[task_log]\nmax_attempts = 0").unwrap();

    let (code, _, stderr) = run_cli(
        &["split", "--config", config.path().to_str().unwrap(), "-"],
        "SELECT 1",
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("max_attempts"));
}
