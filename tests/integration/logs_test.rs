//! Progress, jobs and result sizes derived from operation logs.

use super::{connector_for, remember};
use hs2_notebook::config::Config;
use hs2_notebook::driver::{Engine, MockJobLogs, MockQueryServer};
use hs2_notebook::error::ConnectorError;
use hs2_notebook::session::properties::{Property, SETTINGS};
use hs2_notebook::session::Session;
use hs2_notebook::snippet::{Notebook, Snippet};
use hs2_notebook::HiveServerConnector;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MR_LOG: &str = "\
INFO  : Compiling command(queryId=hive_20240301101010_1a2b): SELECT COUNT(*) FROM web_logs
INFO  : Total jobs = 2
INFO  : Launching Job 1 out of 2
INFO  : Starting Job = job_1709280000000_0007, Tracking URL = http://rm:8088/proxy/application_1709280000000_0007/
INFO  : Ended Job = job_1709280000000_0007
INFO  : Launching Job 2 out of 2
INFO  : Starting Job = job_1709280000000_0008, Tracking URL = http://rm:8088/proxy/application_1709280000000_0008/
INFO  : Ended Job = job_1709280000000_0008
";

const SPARK_LOG: &str = "\
INFO  : Running with YARN Application = application_1709280000000_0042
INFO  : RECORDS_OUT_0: 250
INFO  : Spark Job[9c1e-4b] Metrics
INFO  :   ExecutorRunTime: 1200
INFO  :   ResultSize: 18432
";

fn fast_config() -> Config {
    let mut config = Config::default();
    config.task_log.retry_interval_ms = 1;
    config.job_browser_url = "https://hue.example.com/jobbrowser/jobs/".to_string();
    config
}

/// Runs a query on a server answering with `log`, leaving the snippet in
/// the `available` state.
async fn finished_query(
    log: &str,
    job_logs: Option<Arc<MockJobLogs>>,
) -> (HiveServerConnector, Snippet) {
    let server = Arc::new(MockQueryServer::new().with_log(log));
    let mut connector = connector_for(Engine::Hive, server, fast_config());
    if let Some(job_logs) = job_logs {
        connector = connector.with_job_logs(job_logs);
    }

    let mut snippet = Snippet::new(Engine::Hive, "SELECT COUNT(*) FROM web_logs");
    let response = connector
        .execute(&Notebook::default(), &snippet)
        .await
        .unwrap();
    remember(&mut snippet, &response);
    let status = connector.check_status(&snippet).await.unwrap();
    snippet.status = Some(status.status.as_str().to_string());

    (connector, snippet)
}

fn hive_notebook(execution_engine: &str) -> Notebook {
    Notebook::new(vec![Session {
        id: 1,
        engine: Engine::Hive,
        properties: vec![Property::new(
            SETTINGS,
            json!([{"key": "hive.execution.engine", "value": execution_engine}]),
        )],
        status: None,
        http_addr: None,
    }])
}

#[tokio::test]
async fn test_progress_from_fetched_log() {
    let (connector, snippet) = finished_query(MR_LOG, None).await;

    let log = connector.get_log(&snippet, Some(0)).await.unwrap();
    assert_eq!(connector.progress(&snippet, &log), 100);

    let halfway = "Total jobs = 2\nStarting Job = job_1_1,\nEnded Job = job_1_1\n";
    assert_eq!(connector.progress(&snippet, halfway), 50);
    assert_eq!(connector.progress(&snippet, ""), 5);
}

#[tokio::test]
async fn test_jobs_link_to_job_browser() {
    let (connector, snippet) = finished_query(MR_LOG, None).await;

    let jobs = connector.get_jobs(&Notebook::default(), &snippet, MR_LOG);
    let names: Vec<&str> = jobs.iter().map(|job| job.name.as_str()).collect();

    assert_eq!(names, vec!["job_1709280000000_0007", "job_1709280000000_0008"]);
    assert_eq!(
        jobs[1].url,
        "https://hue.example.com/jobbrowser/jobs/job_1709280000000_0008"
    );
    assert!(jobs.iter().all(|job| job.started && job.finished));
}

#[tokio::test]
async fn test_jobs_follow_session_execution_engine() {
    let (connector, snippet) = finished_query(SPARK_LOG, None).await;

    let jobs = connector.get_jobs(&hive_notebook("spark"), &snippet, SPARK_LOG);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, "application_1709280000000_0042");
    assert!(!jobs[0].finished);

    // The MapReduce pattern finds nothing in a Spark log.
    assert!(connector
        .get_jobs(&Notebook::default(), &snippet, SPARK_LOG)
        .is_empty());
}

#[tokio::test]
async fn test_mr_result_size_from_last_task_log() {
    let job_logs = Arc::new(MockJobLogs::new(vec![
        Some("Unable to locate the log of attempt_1709280000000_0008_m_000000_0".to_string()),
        Some(
            "org.apache.hadoop.hive.ql.exec.FileSinkOperator: RECORDS_OUT_0:31337\n".to_string(),
        ),
    ]));
    let (connector, snippet) = finished_query(MR_LOG, Some(job_logs.clone())).await;

    let size = connector
        .fetch_result_size(&Notebook::default(), &snippet, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(size.rows, Some(31337));
    assert_eq!(size.size, None);
    assert_eq!(
        job_logs.requests().await,
        vec!["job_1709280000000_0008", "job_1709280000000_0008"]
    );
}

#[tokio::test]
async fn test_mr_result_size_without_jobs() {
    let (connector, snippet) = finished_query("INFO  : OK\n", None).await;

    let size = connector
        .fetch_result_size(&Notebook::default(), &snippet, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(size.rows, None);
    assert_eq!(size.message, "Hive query did not execute any jobs.");
}

#[tokio::test]
async fn test_spark_result_size_from_operation_log() {
    let (connector, snippet) = finished_query(SPARK_LOG, None).await;

    let size = connector
        .fetch_result_size(&hive_notebook("spark"), &snippet, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(size.rows, Some(250));
    assert_eq!(size.size, Some(18432));
}

#[tokio::test]
async fn test_result_size_requires_available_hive_query() {
    let (connector, mut snippet) = finished_query(MR_LOG, None).await;

    snippet.status = Some("running".to_string());
    let err = connector
        .fetch_result_size(&Notebook::default(), &snippet, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Query { .. }));

    let impala = connector_for(
        Engine::Impala,
        Arc::new(MockQueryServer::for_engine(Engine::Impala)),
        Config::default(),
    );
    let mut snippet = Snippet::new(Engine::Impala, "SELECT 1");
    snippet.status = Some("available".to_string());
    let err = impala
        .fetch_result_size(&Notebook::default(), &snippet, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(err.is_not_supported());
}
