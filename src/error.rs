//! Crate-level error type
//!
//! Each subsystem owns its error enum; this type unifies them for the
//! evaluation paths that cross subsystem boundaries (iterators, expressions,
//! adapters). Nothing in this crate retries: every error propagates to the
//! immediate caller.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::config::ConfigError;
use crate::expr::EvalError;
use crate::iter::IterError;
use crate::observability::Severity;
use crate::schema::SchemaError;
use crate::serialization::SerializationError;
use crate::spill::SpillError;
use crate::value::ValueError;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Spill(#[from] SpillError),

    #[error(transparent)]
    Iter(#[from] IterError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Value(e) => e.code(),
            Error::Schema(e) => e.code(),
            Error::Serialization(e) => e.code(),
            Error::Spill(e) => e.code(),
            Error::Iter(e) => e.code(),
            Error::Eval(e) => e.code(),
            Error::Adapter(e) => e.code(),
            Error::Config(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Error::Value(e) => e.severity(),
            Error::Schema(e) => e.severity(),
            Error::Serialization(e) => e.severity(),
            Error::Spill(e) => e.severity(),
            Error::Iter(e) => e.severity(),
            Error::Eval(e) => e.severity(),
            Error::Adapter(_) | Error::Config(_) => Severity::Error,
        }
    }

    /// Whether this error reports a programming error rather than bad input
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Serialization(SerializationError::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: Error = ValueError::ArithmeticOverflow("long".into()).into();
        assert_eq!(err.code(), "JQ_VALUE_ARITHMETIC_OVERFLOW");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_io_maps_to_serialization() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.code(), "JQ_SER_IO");
        assert!(err.to_string().contains("disk full"));
    }
}
