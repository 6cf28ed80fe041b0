pub mod cli;
pub mod toml_config;

use crate::core::feed::{DEFAULT_BRANCH_TIMEOUT, DEFAULT_WINDOW};
use crate::core::ConfigProvider;
use crate::utils::error::{AggregatorError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, Validate};
use std::time::Duration;
use toml_config::{TomlConfig, DEFAULT_DATA_FILE};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

pub const MAX_WINDOW: usize = 1_000;
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub(crate) fn validate_settings<C: ConfigProvider>(config: &C) -> Result<()> {
    validate_path("data_file", config.data_file())?;
    validate_range("window", config.window(), 1, MAX_WINDOW)?;
    validate_positive_number("branch_timeout_ms", config.branch_timeout().as_millis() as u64, 1)?;
    Ok(())
}

pub(crate) fn validate_log_level(level: Option<&str>) -> Result<()> {
    match level {
        Some(level) if !LOG_LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level)) => {
            Err(AggregatorError::InvalidConfigValueError {
                field: "logging.level".to_string(),
                value: level.to_string(),
                reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "post-aggregator")]
#[command(about = "Query timelines and merged follow feeds over a post dataset")]
pub struct CliConfig {
    #[arg(long, env = "DATA_FILE", help = "Dataset JSON file [default: /app/data.json]")]
    pub data_file: Option<String>,

    #[arg(long, help = "TOML settings file")]
    pub config: Option<String>,

    #[arg(long, help = "Posts returned per timeline or feed [default: 20]")]
    pub window: Option<usize>,

    #[arg(long, help = "Per-branch feed fan-out timeout [default: 2000]")]
    pub branch_timeout_ms: Option<u64>,

    #[arg(long, help = "Log level for this crate (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// A user's own newest posts
    Timeline { user_id: i32 },
    /// Newest posts across everyone the user follows
    Feed { user_id: i32 },
    /// Ids of the users this user follows
    Following { user_id: i32 },
    /// The user's single newest post
    Latest { user_id: i32 },
    /// User, post and follow-edge counts
    Summary,
}

/// Effective settings: CLI flags and environment, then the TOML file, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_file: String,
    pub window: usize,
    pub branch_timeout: Duration,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_DATA_FILE.to_string(),
            window: DEFAULT_WINDOW,
            branch_timeout: DEFAULT_BRANCH_TIMEOUT,
            log_level: None,
            verbose: false,
            json_logs: false,
        }
    }
}

impl Settings {
    pub fn from_toml(file: &TomlConfig) -> Self {
        Self {
            data_file: file.data_file().to_string(),
            window: file.window(),
            branch_timeout: file.branch_timeout(),
            log_level: file.logging.level.clone(),
            verbose: file.logging.verbose.unwrap_or(false),
            json_logs: file.logging.json.unwrap_or(false),
        }
    }

    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig, file: Option<&TomlConfig>) -> Self {
        let base = file.map(Self::from_toml).unwrap_or_default();
        Self {
            data_file: cli.data_file.clone().unwrap_or(base.data_file),
            window: cli.window.unwrap_or(base.window),
            branch_timeout: cli
                .branch_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(base.branch_timeout),
            log_level: cli.log_level.clone().or(base.log_level),
            verbose: cli.verbose || base.verbose,
            json_logs: cli.json_logs || base.json_logs,
        }
    }
}

impl ConfigProvider for Settings {
    fn data_file(&self) -> &str {
        &self.data_file
    }

    fn window(&self) -> usize {
        self.window
    }

    fn branch_timeout(&self) -> Duration {
        self.branch_timeout
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_settings(self)?;
        validate_log_level(self.log_level.as_deref())
    }
}
