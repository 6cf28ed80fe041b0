use crate::domain::model::{PostId, UserId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },

    #[error("Invalid timestamp '{value}' on post {post_id}: {reason}")]
    InvalidTimestamp {
        post_id: PostId,
        value: String,
        reason: String,
    },

    #[error("User {user_id} already has a post with id {post_id}")]
    DuplicatePost { user_id: UserId, post_id: PostId },

    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: UserId },

    #[error("Recent posts for user {user_id} timed out after {timeout_ms}ms")]
    BranchTimeout { user_id: UserId, timeout_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Data,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AggregatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) => ErrorCategory::Io,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
            Self::SerializationError(_)
            | Self::DatasetError { .. }
            | Self::InvalidTimestamp { .. }
            | Self::DuplicatePost { .. } => ErrorCategory::Data,
            Self::UnknownUser { .. } | Self::BranchTimeout { .. } => ErrorCategory::Query,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // recovered locally: the post or the branch is skipped
            Self::InvalidTimestamp { .. }
            | Self::DuplicatePost { .. }
            | Self::UnknownUser { .. } => ErrorSeverity::Low,
            Self::BranchTimeout { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) | Self::DatasetError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(_) => "Check that the dataset file exists and is readable",
            Self::SerializationError(_) => "Check that the dataset is valid JSON with a top-level \"users\" array",
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Check the configuration file syntax"
            }
            Self::InvalidConfigValueError { .. } => "Correct the offending configuration value",
            Self::DatasetError { .. } => "Fix the dataset so every user id appears exactly once",
            Self::DuplicatePost { .. } => "Use a post id not already taken by this author",
            Self::InvalidTimestamp { .. } => "Use RFC 3339 timestamps such as 2024-01-01T10:00:00Z",
            Self::UnknownUser { .. } => "Check the user id against the loaded dataset",
            Self::BranchTimeout { .. } => "Raise the branch timeout or investigate the slow source",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("Could not read input: {}", e),
            Self::SerializationError(e) => format!("Dataset could not be parsed: {}", e),
            Self::UnknownUser { user_id } => format!("User {} does not exist", user_id),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_record_errors_are_low_severity() {
        let err = AggregatorError::InvalidTimestamp {
            post_id: 7,
            value: "yesterday".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.to_string().contains("post 7"));

        let err = AggregatorError::DuplicatePost { user_id: 2, post_id: 9 };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "User 2 already has a post with id 9");
    }

    #[test]
    fn test_load_errors_are_critical() {
        let err = AggregatorError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Could not read input"));
    }
}
