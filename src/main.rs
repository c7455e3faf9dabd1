//! hs2-notebook - offline tooling for HiveServer2 notebook scripts and logs.

mod cli;

use anyhow::Context;
use cli::{read_input, Cli, Command};
use hs2_notebook::config::Config;
use hs2_notebook::driver::{Engine, MockQueryServer, StaticGateway, User};
use hs2_notebook::logs::{
    self, HiveExecutionEngine, HiveJobLogParser, ResultSizeExtractor, RetryPolicy,
};
use hs2_notebook::snippet::{Notebook, Snippet};
use hs2_notebook::statement::split_statements;
use hs2_notebook::{logging, ConnectorError, HiveServerConnector};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Rows printed per statement by `simulate`.
const SIMULATE_FETCH_ROWS: usize = 100;

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        match e.downcast_ref::<ConnectorError>() {
            Some(err) => error!("{}: {}", err.category(), err),
            None => error!("{e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    match cli.command {
        Command::Split { input } => {
            let script = read(&input)?;
            let statements = split_statements(&script);
            println!("{}", serde_json::to_string_pretty(&statements)?);
        }
        Command::Progress { engine, input } => {
            let log = read(&input)?;
            println!("{}", logs::progress(engine, &log));
        }
        Command::Jobs {
            execution_engine,
            input,
        } => {
            let log = read(&input)?;
            let jobs = hive_jobs(&config, &execution_engine, &log);
            println!("{}", serde_json::to_string_pretty(&jobs)?);
        }
        Command::ResultSize {
            execution_engine,
            input,
        } => {
            let log = read(&input)?;
            let jobs = hive_jobs(&config, &execution_engine, &log);
            let size = ResultSizeExtractor::new(None, RetryPolicy::from(&config.task_log))
                .extract(&execution_engine, &log, &jobs, Duration::ZERO)
                .await?;
            println!("{}", serde_json::to_string_pretty(&size)?);
        }
        Command::Simulate {
            engine,
            user,
            input,
        } => {
            let script = read(&input)?;
            simulate(config, engine, User::new(user), script).await?;
        }
    }

    Ok(())
}

fn read(input: &str) -> anyhow::Result<String> {
    read_input(input).with_context(|| format!("Failed to read {input}"))
}

fn hive_jobs(
    config: &Config,
    execution_engine: &HiveExecutionEngine,
    log: &str,
) -> Vec<logs::Job> {
    logs::get_jobs(
        Engine::Hive,
        execution_engine,
        log,
        &HiveJobLogParser,
        &config.job_browser_url,
    )
}

/// Executes every statement of `script` in turn, the way the notebook does,
/// printing one JSON line per statement.
async fn simulate(config: Config, engine: Engine, user: User, script: String) -> anyhow::Result<()> {
    let server = Arc::new(MockQueryServer::for_engine(engine));
    let gateway = StaticGateway::new().with_driver(engine, server.clone());
    let connector = HiveServerConnector::new(Arc::new(gateway), server, config, user);

    let session = connector.create_session(engine, None).await?;
    let notebook = Notebook::new(vec![session]);
    let mut snippet = Snippet::new(engine, script);

    loop {
        let response = connector.execute(&notebook, &snippet).await?;
        snippet.result.handle = response.to_document()?;
        let has_more = response.statement.state.has_more_statements;

        let status = connector.check_status(&snippet).await?;
        snippet.status = Some(status.status.as_str().to_string());
        let page = connector
            .fetch_result(&snippet, SIMULATE_FETCH_ROWS, true)
            .await?;

        println!(
            "{}",
            json!({
                "statement": response.statement,
                "status": status.status,
                "result": page,
            })
        );

        if !has_more {
            break;
        }
    }

    connector.close_statement(&snippet).await?;
    Ok(())
}
