//! Command-line argument parsing for hs2-notebook.
//!
//! The binary works on saved scripts and operation logs, and can replay a
//! script against the in-memory server.

use clap::{Parser, Subcommand};
use hs2_notebook::config::Config;
use hs2_notebook::driver::Engine;
use hs2_notebook::logs::HiveExecutionEngine;
use std::io::Read;
use std::path::PathBuf;

/// Offline tooling for HiveServer2 notebook scripts and logs.
#[derive(Parser, Debug)]
#[command(name = "hs2-notebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a script into statements and print them as JSON
    Split {
        /// Script file (use "-" for stdin)
        #[arg(value_name = "PATH")]
        input: String,
    },

    /// Estimate query progress from an operation log
    Progress {
        /// Engine that wrote the log (hive, impala, sparksql)
        #[arg(long, value_parser = parse_engine, default_value = "hive")]
        engine: Engine,

        /// Log file (use "-" for stdin)
        #[arg(value_name = "PATH")]
        input: String,
    },

    /// List the jobs announced in a Hive operation log as JSON
    Jobs {
        /// Hive execution engine (mr, spark, tez)
        #[arg(long, value_parser = parse_execution_engine, default_value = "mr")]
        execution_engine: HiveExecutionEngine,

        /// Log file (use "-" for stdin)
        #[arg(value_name = "PATH")]
        input: String,
    },

    /// Extract result row count and size from a Hive operation log
    ResultSize {
        /// Hive execution engine (only spark logs carry sizes)
        #[arg(long, value_parser = parse_execution_engine, default_value = "spark")]
        execution_engine: HiveExecutionEngine,

        /// Log file (use "-" for stdin)
        #[arg(value_name = "PATH")]
        input: String,
    },

    /// Run a script statement by statement against the in-memory server
    Simulate {
        /// Engine the snippet targets
        #[arg(long, value_parser = parse_engine, default_value = "hive")]
        engine: Engine,

        /// User the session is opened for
        #[arg(long, value_name = "NAME", default_value = "demo")]
        user: String,

        /// Script file (use "-" for stdin)
        #[arg(value_name = "PATH")]
        input: String,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path (CLI override or default).
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

fn parse_engine(s: &str) -> std::result::Result<Engine, String> {
    Engine::parse(s).ok_or_else(|| {
        format!("Invalid engine: {s}. Expected: hive, impala, or sparksql")
    })
}

fn parse_execution_engine(s: &str) -> std::result::Result<HiveExecutionEngine, String> {
    match HiveExecutionEngine::parse(s) {
        HiveExecutionEngine::Other(name) => Err(format!(
            "Invalid execution engine: {name}. Expected: mr, spark, or tez"
        )),
        engine => Ok(engine),
    }
}

/// Reads a whole input file, or stdin for `-`.
pub fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        std::fs::read_to_string(path)
    }
}
