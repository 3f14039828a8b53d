//! Operation model and wire adapter for the calc execution engine.
//!
//! A program is an ordered list of operations: assignments (binary arithmetic
//! over literals and variable references) and prints (request a variable's
//! value as output). This crate owns the value objects and the JSON wire
//! format; all validation happens here, so the engine only ever sees
//! well-formed operations.

mod error;
mod op;
mod wire;

pub use error::DecodeError;
pub use op::{BinOp, Operand, Operation, PrintOutput, Program};
pub use wire::{decode_program, encode_outputs, encode_outputs_pretty};

/// Result type for decode/encode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
