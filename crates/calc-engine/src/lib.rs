//! Concurrent execution engine for calc programs.
//!
//! Every operation of a program runs as its own task; data dependencies
//! between them are the only ordering enforced, and they are enforced by a
//! publish/subscribe handoff inside the per-execution [`VarStore`] rather
//! than by program order. A print (or an assignment reading a variable)
//! blocks until the variable it depends on has actually been computed,
//! regardless of which task happens to run first.

mod engine;
mod error;
mod store;

pub use engine::{Engine, EngineConfig, DEFAULT_RESOLVE_TIMEOUT};
pub use error::EngineError;
pub use store::VarStore;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
