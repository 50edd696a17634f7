//! Spill error types
//!
//! Error codes:
//! - JQ_SPILL_IO
//! - JQ_SPILL_FROZEN (FATAL)
//! - JQ_SPILL_NOT_FROZEN (FATAL)
//! - JQ_SPILL_CORRUPT (FATAL)
//!
//! Serialization failures inside a spill file keep their own codes.

use std::io;

use thiserror::Error;

use crate::observability::Severity;
use crate::serialization::SerializationError;

pub type SpillResult<T> = Result<T, SpillError>;

#[derive(Debug, Error)]
pub enum SpillError {
    #[error("spill file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Append on a frozen array
    #[error("cannot append to a frozen spilled array")]
    Frozen,

    /// Iterate or copy before freeze
    #[error("spilled array must be frozen before it is read")]
    NotFrozen,

    #[error("spill file checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    Corrupt { expected: u32, actual: u32 },
}

impl SpillError {
    pub fn code(&self) -> &'static str {
        match self {
            SpillError::Io(_) => "JQ_SPILL_IO",
            SpillError::Serialization(e) => e.code(),
            SpillError::Frozen => "JQ_SPILL_FROZEN",
            SpillError::NotFrozen => "JQ_SPILL_NOT_FROZEN",
            SpillError::Corrupt { .. } => "JQ_SPILL_CORRUPT",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SpillError::Io(_) => Severity::Error,
            SpillError::Serialization(e) => e.severity(),
            SpillError::Frozen | SpillError::NotFrozen | SpillError::Corrupt { .. } => {
                Severity::Fatal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programming_errors_are_fatal() {
        assert_eq!(SpillError::Frozen.severity(), Severity::Fatal);
        assert_eq!(SpillError::NotFrozen.code(), "JQ_SPILL_NOT_FROZEN");
        let io: SpillError = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert_eq!(io.severity(), Severity::Error);
    }

    #[test]
    fn test_serialization_code_passes_through() {
        let err: SpillError = SerializationError::Truncated.into();
        assert_eq!(err.code(), "JQ_SER_TRUNCATED");
    }
}
