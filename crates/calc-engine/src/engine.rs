//! The execution engine.
//!
//! One tokio task per operation, joined through a [`JoinSet`]. Assignments
//! publish into the per-execution [`VarStore`]; prints and reference operands
//! resolve through it, suspending until the producing assignment has run.
//! Outputs are reassembled in print-operation order, never completion order,
//! and the first task error decides the whole result.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use calc_program::{BinOp, Operand, Operation, PrintOutput, Program};

use crate::error::EngineError;
use crate::store::VarStore;

/// Default ceiling on how long a task waits for a dependency before the
/// reference is declared dangling.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    resolve_timeout: Duration,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    /// Override the per-dependency resolve timeout.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What one operation task reports back: a print output tagged with its rank
/// among the program's print operations, or nothing for an assignment.
type TaskResult = Result<Option<(usize, PrintOutput)>, EngineError>;

/// The concurrent program executor.
///
/// Stateless between calls; every [`Engine::execute`] gets a fresh
/// [`VarStore`], so concurrent executions are fully isolated.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run `program` to completion.
    ///
    /// Returns the print outputs in the order the print operations appeared
    /// in the program, or the first error any task observed. `request_id` is
    /// opaque and used only for log correlation. Cancelling `cancel`
    /// unblocks every suspended task and fails the execution with
    /// [`EngineError::Cancelled`].
    pub async fn execute(
        &self,
        request_id: &str,
        program: Program,
        cancel: &CancellationToken,
    ) -> Result<Vec<PrintOutput>, EngineError> {
        tracing::debug!(request_id, operations = program.len(), "executing program");

        let store = Arc::new(VarStore::new());
        // Child token: the engine cancels it on the first error to unpark
        // sibling tasks without touching the caller's token.
        let run_cancel = cancel.child_token();

        let mut tasks: JoinSet<TaskResult> = JoinSet::new();
        let mut print_count = 0usize;

        for operation in program.operations {
            let store = Arc::clone(&store);
            let run_cancel = run_cancel.clone();
            let timeout = self.config.resolve_timeout;

            match operation {
                Operation::Assignment {
                    target,
                    op,
                    left,
                    right,
                } => {
                    tasks.spawn(async move {
                        if run_cancel.is_cancelled() {
                            return Err(EngineError::Cancelled);
                        }
                        let lhs = resolve_operand(&store, &left, timeout, &run_cancel).await?;
                        let rhs = resolve_operand(&store, &right, timeout, &run_cancel).await?;
                        let value = apply(op, lhs, rhs)?;
                        store.publish(&target, value)?;
                        tracing::trace!(var = %target, value, "variable published");
                        Ok(None)
                    });
                }
                Operation::Print { target } => {
                    let rank = print_count;
                    print_count += 1;
                    tasks.spawn(async move {
                        if run_cancel.is_cancelled() {
                            return Err(EngineError::Cancelled);
                        }
                        let value = store.resolve(&target, timeout, &run_cancel).await?;
                        Ok(Some((rank, PrintOutput { var: target, value })))
                    });
                }
            }
        }

        let mut outputs: Vec<Option<PrintOutput>> = vec![None; print_count];
        let mut first_error: Option<EngineError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some((rank, output)))) => outputs[rank] = Some(output),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        // First error wins; unpark everyone still waiting on
                        // a dependency. Their Cancelled results are drained
                        // below without masking this error.
                        run_cancel.cancel();
                        first_error = Some(err);
                    }
                }
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                Err(_) => {
                    if first_error.is_none() {
                        run_cancel.cancel();
                        first_error = Some(EngineError::Cancelled);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            tracing::warn!(request_id, error = %err, "execution failed");
            return Err(err);
        }

        let outputs = outputs
            .into_iter()
            .map(|slot| slot.expect("every print task reports exactly once"))
            .collect::<Vec<_>>();

        tracing::debug!(request_id, outputs = outputs.len(), "execution complete");
        Ok(outputs)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Evaluate an operand: literals resolve instantly, references go through
/// the store and may suspend.
async fn resolve_operand(
    store: &VarStore,
    operand: &Operand,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<i64, EngineError> {
    match operand {
        Operand::Literal(value) => Ok(*value),
        Operand::Reference(name) => store.resolve(name, timeout, cancel).await,
    }
}

/// Apply a binary operator to two resolved values.
///
/// Arithmetic wraps on overflow. Division by an evaluated zero fails with
/// `DivisionByZero`; the target variable stays unset, so dependents time out
/// as `UnresolvedVariable`.
fn apply(op: BinOp, lhs: i64, rhs: i64) -> Result<i64, EngineError> {
    match op {
        BinOp::Add => Ok(lhs.wrapping_add(rhs)),
        BinOp::Sub => Ok(lhs.wrapping_sub(rhs)),
        BinOp::Mul => Ok(lhs.wrapping_mul(rhs)),
        BinOp::Div => {
            if rhs == 0 {
                Err(EngineError::DivisionByZero)
            } else {
                Ok(lhs.wrapping_div(rhs))
            }
        }
    }
}
