//! Value error types
//!
//! Error codes:
//! - JQ_VALUE_TYPE_MISMATCH
//! - JQ_VALUE_ARITHMETIC_OVERFLOW
//! - JQ_VALUE_INVALID_LITERAL

use thiserror::Error;

use crate::observability::Severity;

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Value errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// A value of one variant was used where another was required
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Exact conversion or checked arithmetic lost information
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Text that should denote a value of `kind` could not be parsed
    #[error("invalid {kind} literal: {text}")]
    InvalidLiteral { kind: &'static str, text: String },
}

impl ValueError {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ValueError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_literal(kind: &'static str, text: impl Into<String>) -> Self {
        ValueError::InvalidLiteral {
            kind,
            text: text.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ValueError::TypeMismatch { .. } => "JQ_VALUE_TYPE_MISMATCH",
            ValueError::ArithmeticOverflow(_) => "JQ_VALUE_ARITHMETIC_OVERFLOW",
            ValueError::InvalidLiteral { .. } => "JQ_VALUE_INVALID_LITERAL",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = ValueError::type_mismatch("record", "array");
        assert_eq!(err.to_string(), "type mismatch: expected record, found array");
        assert_eq!(err.code(), "JQ_VALUE_TYPE_MISMATCH");
    }

    #[test]
    fn test_invalid_literal_message() {
        let err = ValueError::invalid_literal("hex", "0G");
        assert_eq!(err.to_string(), "invalid hex literal: 0G");
    }
}
