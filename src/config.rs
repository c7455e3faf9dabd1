//! Configuration management for the connector.
//!
//! Handles loading configuration from a TOML file. Every field has a default,
//! so a missing file or an empty one yields a working configuration.

use crate::driver::Engine;
use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Consult per-user default configurations before the built-in property
    /// schema when a session is created without properties.
    #[serde(default)]
    pub use_default_configuration: bool,

    /// Database used when a snippet does not name one.
    #[serde(default = "default_database")]
    pub default_database: String,

    /// Base URL of the job browser; job ids are appended to it.
    #[serde(default = "default_job_browser_url")]
    pub job_browser_url: String,

    /// Hive (HiveServer2) settings.
    #[serde(default)]
    pub hive: EngineConfig,

    /// Impala settings.
    #[serde(default)]
    pub impala: EngineConfig,

    /// Task log retrieval used to count result rows.
    #[serde(default)]
    pub task_log: TaskLogConfig,
}

/// Per-engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Close operations when the UI is done with a statement.
    #[serde(default = "default_close_queries")]
    pub close_queries: bool,

    /// Settings offered to the user for this engine.
    #[serde(default)]
    pub settings_whitelist: Vec<String>,
}

/// Retry policy for task logs that are not archived yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLogConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_database() -> String {
    "default".to_string()
}

fn default_job_browser_url() -> String {
    "/jobbrowser/jobs/".to_string()
}

fn default_close_queries() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_interval_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_default_configuration: false,
            default_database: default_database(),
            job_browser_url: default_job_browser_url(),
            hive: EngineConfig::default(),
            impala: EngineConfig::default(),
            task_log: TaskLogConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            close_queries: default_close_queries(),
            settings_whitelist: Vec::new(),
        }
    }
}

impl Default for TaskLogConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl TaskLogConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hs2-notebook")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses and validates configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ConnectorError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.task_log.max_attempts == 0 {
            return Err(ConnectorError::config(
                "task_log.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Whether statements of `engine` are closed when the UI releases them.
    pub fn close_queries(&self, engine: Engine) -> bool {
        match engine {
            Engine::Hive => self.hive.close_queries,
            Engine::Impala => self.impala.close_queries,
            Engine::SparkSql => false,
        }
    }

    /// Settings offered for `engine`. SparkSQL shares the Hive list.
    pub fn settings_whitelist(&self, engine: Engine) -> &[String] {
        match engine {
            Engine::Impala => &self.impala.settings_whitelist,
            Engine::Hive | Engine::SparkSql => &self.hive.settings_whitelist,
        }
    }
}
