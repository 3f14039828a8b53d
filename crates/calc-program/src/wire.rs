//! JSON wire adapter.
//!
//! The wire format is a JSON array of operation objects:
//!
//! ```json
//! [
//!   {"type": "calc", "op": "+", "var": "x", "left": 1, "right": 2},
//!   {"type": "print", "var": "x"}
//! ]
//! ```
//!
//! An operand is a JSON number, a quoted integer (accepted as a literal), or
//! an identifier string naming another variable. Everything is validated here
//! and converted into the canonical [`Operation`] model before the engine
//! sees it.

use serde::Deserialize;

use crate::error::DecodeError;
use crate::op::{BinOp, Operand, Operation, PrintOutput, Program};

/// Raw operand as it appears on the wire, before validation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOperand {
    Number(i64),
    Text(String),
}

/// Raw operation object as it appears on the wire, before validation.
#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    op: Option<String>,
    var: String,
    #[serde(default)]
    left: Option<RawOperand>,
    #[serde(default)]
    right: Option<RawOperand>,
}

/// A variable name is one or more ASCII letters or underscores.
fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
}

fn validate_operand(raw: RawOperand) -> Result<Operand, DecodeError> {
    match raw {
        RawOperand::Number(n) => Ok(Operand::Literal(n)),
        RawOperand::Text(s) => {
            // Quoted integers count as literals, matching the lenient
            // clients this service has to accept.
            if let Ok(n) = s.parse::<i64>() {
                Ok(Operand::Literal(n))
            } else if is_identifier(&s) {
                Ok(Operand::Reference(s))
            } else {
                Err(DecodeError::InvalidOperand(s))
            }
        }
    }
}

fn validate_operation(raw: RawOperation) -> Result<Operation, DecodeError> {
    if raw.var.is_empty() {
        return Err(DecodeError::EmptyTarget);
    }

    match raw.kind.as_str() {
        "calc" => {
            let symbol = raw.op.unwrap_or_default();
            let op = BinOp::from_symbol(&symbol)
                .ok_or_else(|| DecodeError::invalid_operator(&raw.var, &symbol))?;
            let left = raw
                .left
                .ok_or_else(|| DecodeError::missing_operand(&raw.var, "left"))?;
            let right = raw
                .right
                .ok_or_else(|| DecodeError::missing_operand(&raw.var, "right"))?;

            Ok(Operation::Assignment {
                target: raw.var,
                op,
                left: validate_operand(left)?,
                right: validate_operand(right)?,
            })
        }
        "print" => Ok(Operation::Print { target: raw.var }),
        other => Err(DecodeError::InvalidOperationType(other.to_string())),
    }
}

/// Decode a JSON operation list into a validated [`Program`].
pub fn decode_program(data: &[u8]) -> Result<Program, DecodeError> {
    let raw: Vec<RawOperation> = serde_json::from_slice(data)?;
    let operations = raw
        .into_iter()
        .map(validate_operation)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program::new(operations))
}

/// Encode print outputs back to the JSON wire form.
pub fn encode_outputs(outputs: &[PrintOutput]) -> Result<Vec<u8>, DecodeError> {
    Ok(serde_json::to_vec(outputs)?)
}

/// Encode print outputs as indented JSON, for human-facing output.
pub fn encode_outputs_pretty(outputs: &[PrintOutput]) -> Result<Vec<u8>, DecodeError> {
    Ok(serde_json::to_vec_pretty(outputs)?)
}
