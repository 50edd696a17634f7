//! Iterator error types
//!
//! Error codes:
//! - JQ_ITER_POISONED
//! - JQ_ITER_NULL_SEQUENCE (FATAL)

use thiserror::Error;

use crate::observability::Severity;

pub type IterResult<T> = Result<T, IterError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IterError {
    /// An earlier `move_next` failed; the sequence cannot continue
    #[error("sequence is unusable after an earlier failure: {cause}")]
    Poisoned { cause: String },

    /// A consumer advanced the null sequence without checking `is_null`
    #[error("the null sequence cannot be advanced")]
    NullSequence,
}

impl IterError {
    pub fn code(&self) -> &'static str {
        match self {
            IterError::Poisoned { .. } => "JQ_ITER_POISONED",
            IterError::NullSequence => "JQ_ITER_NULL_SEQUENCE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IterError::Poisoned { .. } => Severity::Error,
            IterError::NullSequence => Severity::Fatal,
        }
    }
}
