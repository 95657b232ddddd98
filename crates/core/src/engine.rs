//! Invocation engine shared by the synchronous and background entry points.
//!
//! Binds the call, hands the plan to the executor and translates any backend
//! failure into its user-facing message.

use crate::backend::{report, InvocationStage, OutValues, ProcedureInvoker, StageSender};
use crate::call_builder::{build_call, CallPlan};
use crate::error_translator::translate;
use crate::procedure::ProcedureCall;

/// A failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvocationFailure {
    /// Translated, user-facing message.
    pub message: String,
    /// Message as returned by the driver.
    pub raw: String,
    /// Call text that was sent.
    pub sql: String,
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    pub sql: String,
    pub out: OutValues,
}

/// Run `call` through `invoker`, reporting stages on `stages`.
pub async fn run_call(
    invoker: &dyn ProcedureInvoker,
    call: &ProcedureCall,
    stages: StageSender,
) -> Result<InvocationOutcome, InvocationFailure> {
    let plan: CallPlan = build_call(call);
    let sql = plan.sql.clone();
    report(&stages, InvocationStage::Bound);

    tracing::debug!(
        routine = %call.qualified_name(),
        slots = plan.slots.len(),
        outputs = plan.output_count(),
        "Invoking routine"
    );

    match invoker.invoke(plan, stages).await {
        Ok(out) => Ok(InvocationOutcome { sql, out }),
        Err(err) => {
            let message = translate(&err.message, call.name(), call.kind());
            tracing::warn!(
                routine = %call.qualified_name(),
                stage = %err.stage,
                error = %err.message,
                "Invocation failed"
            );
            Err(InvocationFailure {
                message,
                raw: err.message,
                sql,
            })
        }
    }
}
