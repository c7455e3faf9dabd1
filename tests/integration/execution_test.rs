//! Multi-statement execution through the connector.

use super::{hive_connector, remember};
use hs2_notebook::driver::{Engine, MockQueryServer};
use hs2_notebook::error::{BackendFault, ConnectorError};
use hs2_notebook::handle;
use hs2_notebook::snippet::{Notebook, Snippet};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const SCRIPT: &str = "SELECT 1;\nSELECT 2;\nSELECT 3";

#[tokio::test]
async fn test_script_runs_one_statement_per_call() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());
    let notebook = Notebook::default();
    let mut snippet = Snippet::new(Engine::Hive, SCRIPT);

    let mut seen = Vec::new();
    for _ in 0..3 {
        let response = connector.execute(&notebook, &snippet).await.unwrap();
        seen.push((
            response.statement.state.statement_id,
            response.statement.state.has_more_statements,
            response.statement.statement.text.clone(),
        ));
        remember(&mut snippet, &response);
    }

    assert_eq!(
        seen,
        vec![
            (0, true, "SELECT 1".to_string()),
            (1, true, "SELECT 2".to_string()),
            (2, false, "SELECT 3".to_string()),
        ]
    );

    // Only the first statement switches database.
    assert_eq!(server.used_databases().await, vec!["default"]);

    // Each continuation released the operation of the statement before it.
    let closed: Vec<Vec<u8>> = server
        .closed_operations()
        .await
        .into_iter()
        .map(|operation| operation.guid)
        .collect();
    assert_eq!(closed, vec![b"guid-1".to_vec(), b"guid-2".to_vec()]);
}

#[tokio::test]
async fn test_finished_script_starts_over() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());
    let notebook = Notebook::default();
    let mut snippet = Snippet::new(Engine::Hive, "SELECT 1");

    let first = connector.execute(&notebook, &snippet).await.unwrap();
    remember(&mut snippet, &first);
    let second = connector.execute(&notebook, &snippet).await.unwrap();

    assert_eq!(second.statement.state.statement_id, 0);
    assert_eq!(server.used_databases().await.len(), 2);
    assert!(server.closed_operations().await.is_empty());
}

#[tokio::test]
async fn test_edited_script_restarts_from_first_statement() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());
    let notebook = Notebook::default();
    let mut snippet = Snippet::new(Engine::Hive, SCRIPT);

    let first = connector.execute(&notebook, &snippet).await.unwrap();
    remember(&mut snippet, &first);

    snippet.statement = "SELECT 1;\nSELECT 2".to_string();
    let restarted = connector.execute(&notebook, &snippet).await.unwrap();

    assert_eq!(restarted.statement.state.statement_id, 0);
    assert_eq!(restarted.statement.state.statements_count, 2);
    assert!(restarted.statement.state.has_more_statements);
}

#[tokio::test]
async fn test_response_document_round_trips() {
    let connector = hive_connector(Arc::new(MockQueryServer::new()));
    let snippet = Snippet::new(Engine::Hive, "SHOW TABLES");

    let response = connector
        .execute(&Notebook::default(), &snippet)
        .await
        .unwrap();
    let document = response.to_document().unwrap();

    assert_eq!(document["statement_id"], 0);
    assert_eq!(document["has_more_statements"], false);
    assert_eq!(document["statement"], "SHOW TABLES");

    let operation = handle::decode(&document).unwrap();
    assert_eq!(operation.secret, b"secret-1".to_vec());
    assert!(operation.has_result_set);
}

#[tokio::test]
async fn test_empty_script_is_rejected() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());
    let snippet = Snippet::new(Engine::Hive, "  -- nothing to run\n");

    let err = connector
        .execute(&Notebook::default(), &snippet)
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::Query { .. }));
    assert!(server.submitted().await.is_empty());
}

#[tokio::test]
async fn test_rejected_statement_is_reported_with_its_position() {
    let server = Arc::new(
        MockQueryServer::new().failing_query(BackendFault::Session(
            "Error while compiling statement: FAILED: ParseException line 1:7".to_string(),
        )),
    );
    let connector = hive_connector(server);
    let snippet = Snippet::new(Engine::Hive, "SELEC 1;\nSELECT 2");

    let err = connector
        .execute(&Notebook::default(), &snippet)
        .await
        .unwrap_err();

    match err {
        ConnectorError::Query {
            message,
            statement: Some(statement),
        } => {
            assert!(message.contains("ParseException"));
            assert_eq!(statement.statement.text, "SELEC 1");
            assert_eq!(statement.state.statement_id, 0);
        }
        other => panic!("Expected a query error with its statement, got {other:?}"),
    }
}

#[tokio::test]
async fn test_explain_and_export() {
    let connector = hive_connector(Arc::new(MockQueryServer::new()));
    let notebook = Notebook::default();
    let mut snippet = Snippet::new(Engine::Hive, "SELECT * FROM web_logs");
    snippet.database = Some("logs".to_string());

    let explained = connector.explain(&notebook, &snippet).await.unwrap();
    assert_eq!(explained.status, 0);
    assert_eq!(explained.statement, "SELECT * FROM web_logs");
    assert!(explained.explanation.contains("STAGE DEPENDENCIES"));

    let export = connector
        .export_data_as_table(&notebook, &snippet, "archive.web_logs_2024", false, None)
        .await
        .unwrap();
    assert_eq!(
        export.hql,
        "CREATE TABLE `archive`.`web_logs_2024` AS SELECT * FROM web_logs"
    );

    let export = connector
        .export_large_data_to_hdfs(&notebook, &snippet, "/user/alice/web_logs")
        .await
        .unwrap();
    assert_eq!(
        export.hql,
        "INSERT OVERWRITE DIRECTORY '/user/alice/web_logs' SELECT * FROM web_logs"
    );
}
