//! Value objects describing one calc program.
//!
//! Operations are immutable once constructed; the engine never mutates them.
//! Program order matters only for print operations (it fixes the output
//! order) and is irrelevant to assignment scheduling.

use serde::{Deserialize, Serialize};

/// One side of a binary assignment: a literal integer or a reference to
/// another variable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(i64),
    Reference(String),
}

/// Binary operator of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Wire symbol for this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    /// Parse a wire symbol. Returns `None` for anything outside `+ - * /`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinOp::Add),
            "-" => Some(BinOp::Sub),
            "*" => Some(BinOp::Mul),
            "/" => Some(BinOp::Div),
            _ => None,
        }
    }
}

/// A single program operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Compute `left <op> right` and bind the result to `target`.
    Assignment {
        target: String,
        op: BinOp,
        left: Operand,
        right: Operand,
    },
    /// Emit the value of `target` as output.
    Print { target: String },
}

impl Operation {
    /// The variable this operation targets (written by an assignment,
    /// read by a print).
    pub fn target(&self) -> &str {
        match self {
            Operation::Assignment { target, .. } => target,
            Operation::Print { target } => target,
        }
    }
}

/// An ordered, fixed-length list of operations, known in full before
/// execution starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub operations: Vec<Operation>,
}

impl Program {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// One line of program output: the printed variable and its value, produced
/// in the same relative order as the print operations appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOutput {
    pub var: String,
    pub value: i64,
}
