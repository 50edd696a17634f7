//! Evaluation error types
//!
//! Error codes:
//! - JQ_EVAL_UNBOUND_VARIABLE
//! - JQ_EVAL_UNKNOWN_FUNCTION
//! - JQ_EVAL_DUPLICATE_FUNCTION
//! - JQ_EVAL_ARITY
//! - JQ_EVAL_INVALID_ARGUMENT
//! - JQ_EVAL_DIVISION_BY_ZERO

use thiserror::Error;

use crate::observability::Severity;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbound variable ${0}")]
    UnboundVariable(String),

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("function {0} is already registered")]
    DuplicateFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("division by zero")]
    DivisionByZero,
}

impl EvalError {
    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EvalError::UnboundVariable(_) => "JQ_EVAL_UNBOUND_VARIABLE",
            EvalError::UnknownFunction(_) => "JQ_EVAL_UNKNOWN_FUNCTION",
            EvalError::DuplicateFunction(_) => "JQ_EVAL_DUPLICATE_FUNCTION",
            EvalError::Arity { .. } => "JQ_EVAL_ARITY",
            EvalError::InvalidArgument { .. } => "JQ_EVAL_INVALID_ARGUMENT",
            EvalError::DivisionByZero => "JQ_EVAL_DIVISION_BY_ZERO",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}
