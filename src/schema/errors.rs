//! Schema error types
//!
//! Error codes:
//! - JQ_SCHEMA_NOT_CONSTANT (FATAL)
//! - JQ_SCHEMA_VIOLATION
//! - JQ_SCHEMA_INVALID_PARAMETER

use thiserror::Error;

use crate::observability::Severity;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// `get_constant` called on a schema that admits more than one value
    #[error("schema is not constant: {schema}")]
    NotConstant { schema: String },

    /// A value was assigned to a slot whose declared schema rejects it
    #[error("schema violation in {slot}: value {value} does not match {expected}")]
    Violation {
        slot: String,
        value: String,
        expected: String,
    },

    /// A schema constructor received a parameter it does not understand
    #[error("invalid schema parameter for {schema}: {message}")]
    InvalidParameter { schema: String, message: String },
}

impl SchemaError {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::NotConstant { .. } => "JQ_SCHEMA_NOT_CONSTANT",
            SchemaError::Violation { .. } => "JQ_SCHEMA_VIOLATION",
            SchemaError::InvalidParameter { .. } => "JQ_SCHEMA_INVALID_PARAMETER",
        }
    }

    /// Asking a non-constant schema for its constant is a programming error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaError::NotConstant { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_message_carries_context() {
        let err = SchemaError::Violation {
            slot: "$x".into(),
            value: "\"abc\"".into(),
            expected: "long".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("$x"));
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("long"));
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_not_constant_is_fatal() {
        let err = SchemaError::NotConstant {
            schema: "long".into(),
        };
        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(err.code(), "JQ_SCHEMA_NOT_CONSTANT");
    }
}
