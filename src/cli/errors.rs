//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file could not be loaded or is invalid
    ConfigError,
    /// Input or output could not be opened, read or written
    IoError,
    /// The engine rejected the data
    EngineError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "JQ_CLI_CONFIG_ERROR",
            Self::IoError => "JQ_CLI_IO_ERROR",
            Self::EngineError => "JQ_CLI_ENGINE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{} ({})", e, e.code()))
    }
}

/// Engine errors keep their own code in the message
impl From<crate::Error> for CliError {
    fn from(e: crate::Error) -> Self {
        match e {
            crate::Error::Config(c) => c.into(),
            other => Self::new(CliErrorCode::EngineError, format!("{} ({})", other, other.code())),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueError;

    #[test]
    fn test_engine_error_keeps_code() {
        let err: CliError = crate::Error::from(ValueError::type_mismatch("long", "string")).into();
        assert_eq!(err.code(), &CliErrorCode::EngineError);
        assert!(err.message().contains("JQ_VALUE_TYPE_MISMATCH"));
        assert!(err.to_string().starts_with("JQ_CLI_ENGINE_ERROR: "));
    }

    #[test]
    fn test_config_error_maps_to_config_code() {
        let err: CliError = crate::Error::from(ConfigError::invalid("bad")).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
