/// Error types for the execution engine

use calc_program::DecodeError;
use thiserror::Error;

/// Every error is terminal for the execution that raised it: the engine does
/// not retry or partially recover, and a failed execution yields zero
/// outputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("variable '{0}' assigned more than once")]
    DuplicateAssignment(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("variable '{0}' was never resolved")]
    UnresolvedVariable(String),

    #[error("execution cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn duplicate_assignment(name: impl Into<String>) -> Self {
        EngineError::DuplicateAssignment(name.into())
    }

    pub fn unresolved_variable(name: impl Into<String>) -> Self {
        EngineError::UnresolvedVariable(name.into())
    }
}

impl From<DecodeError> for EngineError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidOperand(_) | DecodeError::MissingOperand { .. } => {
                EngineError::InvalidOperand(err.to_string())
            }
            _ => EngineError::InvalidOperation(err.to_string()),
        }
    }
}
