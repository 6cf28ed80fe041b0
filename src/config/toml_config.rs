use crate::core::feed::{DEFAULT_BRANCH_TIMEOUT, DEFAULT_WINDOW};
use crate::core::ConfigProvider;
use crate::utils::error::{AggregatorError, Result};
use crate::utils::validation::Validate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATA_FILE: &str = "/app/data.json";

/// File-based settings. Every section and key is optional.
///
/// ```toml
/// [data]
/// file = "${DATA_DIR}/data.json"
///
/// [feed]
/// window = 20
/// branch_timeout_ms = 2000
///
/// [logging]
/// level = "info"
/// verbose = false
/// json = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    pub window: Option<usize>,
    pub branch_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for this crate's events: trace, debug, info, warn or error.
    pub level: Option<String>,
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AggregatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| AggregatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AggregatorError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }
}

impl ConfigProvider for TomlConfig {
    fn data_file(&self) -> &str {
        self.data.file.as_deref().unwrap_or(DEFAULT_DATA_FILE)
    }

    fn window(&self) -> usize {
        self.feed.window.unwrap_or(DEFAULT_WINDOW)
    }

    fn branch_timeout(&self) -> Duration {
        self.feed
            .branch_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BRANCH_TIMEOUT)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        super::validate_settings(self)?;
        super::validate_log_level(self.logging.level.as_deref())
    }
}
