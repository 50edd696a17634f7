//! Configuration error types
//!
//! Error codes:
//! - JQ_CONFIG_READ
//! - JQ_CONFIG_PARSE
//! - JQ_CONFIG_INVALID

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    /// Well-formed JSON with an unacceptable value
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "JQ_CONFIG_READ",
            ConfigError::Parse(_) => "JQ_CONFIG_PARSE",
            ConfigError::Invalid(_) => "JQ_CONFIG_INVALID",
        }
    }
}
