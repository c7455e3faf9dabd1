//! Sessions and session properties through the connector.

use super::{connector_for, hive_connector};
use hs2_notebook::config::Config;
use hs2_notebook::driver::{Engine, MockQueryServer};
use hs2_notebook::session::properties::{Property, Setting, FILES, FUNCTIONS, SETTINGS};
use hs2_notebook::session::SessionRef;
use hs2_notebook::snippet::{Notebook, Snippet};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_session_lifecycle() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());

    let session = connector.create_session(Engine::Hive, None).await.unwrap();
    let again = connector.create_session(Engine::Hive, None).await.unwrap();
    assert_eq!(session.id, again.id);
    assert_eq!(server.open_sessions().await.len(), 1);

    let target = SessionRef {
        id: session.id,
        engine: Engine::Hive,
    };
    let closed = connector.close_session(&target).await.unwrap();
    assert_eq!(closed.status, 0);
    assert_eq!(closed.message, "Session successfully closed.");

    let missing = connector.close_session(&target).await.unwrap();
    assert_eq!(missing.status, -1);
    assert_eq!(
        missing.message,
        "Session does not exist or you do not have permissions to close the session."
    );
}

#[tokio::test]
async fn test_session_settings_apply_to_snippets_without_their_own() {
    let server = Arc::new(MockQueryServer::new());
    let connector = hive_connector(server.clone());

    let properties = vec![
        Property::new(FILES, json!([])),
        Property::new(FUNCTIONS, json!([])),
        Property::new(
            SETTINGS,
            json!([{"key": "mapreduce.job.queuename", "value": "etl"}]),
        ),
    ];
    let session = connector
        .create_session(Engine::Hive, Some(properties))
        .await
        .unwrap();
    let notebook = Notebook::new(vec![session]);

    let snippet = Snippet::new(Engine::Hive, "SELECT 1");
    connector.execute(&notebook, &snippet).await.unwrap();

    let mut overriding = Snippet::new(Engine::Hive, "SELECT 2");
    overriding.properties.settings = vec![Setting::new("mapreduce.job.queuename", "adhoc")];
    connector.execute(&notebook, &overriding).await.unwrap();

    let submitted = server.submitted().await;
    assert_eq!(
        submitted[0].settings,
        vec![Setting::new("mapreduce.job.queuename", "etl")]
    );
    assert_eq!(
        submitted[1].settings,
        vec![Setting::new("mapreduce.job.queuename", "adhoc")]
    );
}

#[test]
fn test_property_schema_per_engine() {
    let mut config = Config::default();
    config.impala.settings_whitelist = vec!["MEM_LIMIT".to_string()];
    let connector = connector_for(
        Engine::Impala,
        Arc::new(MockQueryServer::for_engine(Engine::Impala)),
        config,
    );

    let hive: Vec<String> = connector
        .get_properties(Engine::Hive)
        .into_iter()
        .map(|p| p.key)
        .collect();
    assert_eq!(hive, vec![FILES, FUNCTIONS, SETTINGS]);

    let impala = connector.get_properties(Engine::Impala);
    assert_eq!(impala.len(), 1);
    assert_eq!(impala[0].options, Some(vec!["mem_limit".to_string()]));
}

#[test]
fn test_legacy_settings_are_upgraded() {
    let connector = hive_connector(Arc::new(MockQueryServer::new()));

    let legacy = json!([{"key": "hive.exec.parallel", "value": "true"}]);
    let upgraded = connector.upgrade_properties(Engine::Hive, &legacy);

    assert_eq!(upgraded.len(), 3);
    let settings = upgraded.iter().find(|p| p.key == SETTINGS).unwrap();
    assert_eq!(settings.value, legacy);

    let garbage = connector.upgrade_properties(Engine::Hive, &json!({"not": "a list"}));
    assert_eq!(garbage, connector.get_properties(Engine::Hive));
}
