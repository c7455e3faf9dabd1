//! Connector tests against `MockQueryServer`.

pub mod execution_test;
pub mod logs_test;
pub mod session_test;

use hs2_notebook::config::Config;
use hs2_notebook::driver::{Engine, MockQueryServer, StaticGateway, User};
use hs2_notebook::query::ExecuteResponse;
use hs2_notebook::snippet::Snippet;
use hs2_notebook::HiveServerConnector;
use std::sync::Arc;

/// Connector serving `engine` from `server`, which also stores sessions.
pub fn connector_for(
    engine: Engine,
    server: Arc<MockQueryServer>,
    config: Config,
) -> HiveServerConnector {
    let gateway = StaticGateway::new().with_driver(engine, server.clone());
    HiveServerConnector::new(Arc::new(gateway), server, config, User::new("alice"))
}

pub fn hive_connector(server: Arc<MockQueryServer>) -> HiveServerConnector {
    connector_for(Engine::Hive, server, Config::default())
}

/// Stores the execute response in the snippet, as the notebook does.
pub fn remember(snippet: &mut Snippet, response: &ExecuteResponse) {
    snippet.result.handle = response.to_document().unwrap();
}
