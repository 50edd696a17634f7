//! Adapter error types
//!
//! Error codes:
//! - JQ_ADAPTER_NOT_OPEN
//! - JQ_ADAPTER_CLOSED
//! - JQ_ADAPTER_IO
//! - JQ_ADAPTER_PARSE

use std::io;

use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter used before open")]
    NotOpen,

    #[error("adapter used after close")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line of text input that does not parse
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
}

impl AdapterError {
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::NotOpen => "JQ_ADAPTER_NOT_OPEN",
            AdapterError::Closed => "JQ_ADAPTER_CLOSED",
            AdapterError::Io(_) => "JQ_ADAPTER_IO",
            AdapterError::Parse { .. } => "JQ_ADAPTER_PARSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AdapterError::NotOpen.code(), "JQ_ADAPTER_NOT_OPEN");
        assert_eq!(AdapterError::Closed.code(), "JQ_ADAPTER_CLOSED");
        let parse = AdapterError::Parse {
            line: 3,
            message: "expected value".to_string(),
        };
        assert_eq!(parse.code(), "JQ_ADAPTER_PARSE");
        assert_eq!(parse.to_string(), "line 3: expected value");
    }
}
