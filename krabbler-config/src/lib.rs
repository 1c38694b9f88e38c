use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Application configuration, loaded from a YAML file.
///
/// Every section and every field falls back to its default when missing,
/// so a partial file is fine and an empty file means "all defaults".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "app_db".to_string(),
            pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: String,
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: "app.log".to_string(),
            max_files: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub workers: usize,
    pub timeout_seconds: u64,
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            workers: 4,
            timeout_seconds: 30,
        }
    }
}

/// Parameters for the orchestrator driving the crawl: how often to retry a
/// failed fetch, how long to pause between requests, and how many records
/// to hand to a worker at once. The registry itself never reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub batch_size: usize,
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            max_retries: 3,
            delay_ms: 1000,
            batch_size: 50,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        debug!("loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parses configuration from a YAML string. A blank document is the
    /// all-defaults configuration; malformed YAML is an error.
    pub fn from_yaml(raw: &str) -> Result<Config> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        let config = serde_yaml::from_str(raw)?;
        Ok(config)
    }
}
