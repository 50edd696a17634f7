//! Serialization error types
//!
//! Error codes:
//! - JQ_SER_IO
//! - JQ_SER_TRUNCATED
//! - JQ_SER_MALFORMED
//! - JQ_SER_UNKNOWN_TAG
//! - JQ_SER_SCHEMA_MISMATCH
//! - JQ_SER_UNSUPPORTED
//! - JQ_SER_PARSE
//!
//! Corrupt or truncated input is never repaired: the stream position after
//! an error is unspecified and the stream must be abandoned.

use std::io;

use thiserror::Error;

use crate::observability::Severity;
use crate::schema::SchemaError;
use crate::value::ValueError;

/// Result type for serialization operations
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Serialization errors
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// The stream ended inside an encoded value
    #[error("truncated input")]
    Truncated,

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("unknown type tag {0:#04x}")]
    UnknownTag(u8),

    /// A schema-bound serializer was handed a value outside its schema
    #[error("value {value} does not match serializer schema {schema}")]
    SchemaMismatch { value: String, schema: String },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<io::Error> for SerializationError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            SerializationError::Truncated
        } else {
            SerializationError::Io(err)
        }
    }
}

impl SerializationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        SerializationError::Malformed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            SerializationError::Io(_) => "JQ_SER_IO",
            SerializationError::Truncated => "JQ_SER_TRUNCATED",
            SerializationError::Malformed(_) => "JQ_SER_MALFORMED",
            SerializationError::UnknownTag(_) => "JQ_SER_UNKNOWN_TAG",
            SerializationError::SchemaMismatch { .. } => "JQ_SER_SCHEMA_MISMATCH",
            SerializationError::Unsupported(_) => "JQ_SER_UNSUPPORTED",
            SerializationError::Parse { .. } => "JQ_SER_PARSE",
            SerializationError::Value(e) => e.code(),
            SerializationError::Schema(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SerializationError::Schema(e) => e.severity(),
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_becomes_truncated() {
        let err: SerializationError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, SerializationError::Truncated));
        assert_eq!(err.code(), "JQ_SER_TRUNCATED");
    }

    #[test]
    fn test_unknown_tag_message() {
        assert_eq!(SerializationError::UnknownTag(3).to_string(), "unknown type tag 0x03");
    }
}
