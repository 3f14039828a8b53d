/// Error types for program decoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid operation type '{0}'")]
    InvalidOperationType(String),

    #[error("invalid operator '{op}' in assignment to '{target}'")]
    InvalidOperator { target: String, op: String },

    #[error("invalid operand '{0}': expected an integer or a variable name")]
    InvalidOperand(String),

    #[error("assignment to '{target}' is missing its {side} operand")]
    MissingOperand { target: String, side: &'static str },

    #[error("operation has an empty variable name")]
    EmptyTarget,
}

impl DecodeError {
    pub fn invalid_operator(target: impl Into<String>, op: impl Into<String>) -> Self {
        DecodeError::InvalidOperator {
            target: target.into(),
            op: op.into(),
        }
    }

    pub fn missing_operand(target: impl Into<String>, side: &'static str) -> Self {
        DecodeError::MissingOperand {
            target: target.into(),
            side,
        }
    }
}
