//! Backend seam: the trait every invocation executor implements.
//!
//! The gateway only ever talks to the database through [`ProcedureInvoker`],
//! so the HTTP layer and job runner can be exercised against an in-process
//! scripted backend.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::call_builder::CallPlan;

/// Harvested OUT values keyed by parameter name.
pub type OutValues = Map<String, Value>;

/// Channel on which an executor reports how far an invocation got.
///
/// Unbounded so that reporting never blocks the driver thread.
pub type StageSender = mpsc::UnboundedSender<InvocationStage>;
pub type StageReceiver = mpsc::UnboundedReceiver<InvocationStage>;

/// Create a stage channel.
pub fn stage_channel() -> (StageSender, StageReceiver) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Milestones of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStage {
    /// Arguments classified into bind slots.
    Bound,
    /// Statement prepared on a pooled connection.
    Prepared,
    /// Statement sent to the backend.
    Executing,
    /// OUT values read back.
    Harvested,
}

impl InvocationStage {
    /// Job progress recorded when this stage is reached. `Prepared` is a
    /// checkpoint without a progress change.
    pub fn progress(self) -> Option<u8> {
        match self {
            InvocationStage::Bound => Some(crate::job::PROGRESS_BOUND),
            InvocationStage::Prepared => None,
            InvocationStage::Executing => Some(crate::job::PROGRESS_EXECUTING),
            InvocationStage::Harvested => Some(crate::job::PROGRESS_HARVESTED),
        }
    }
}

/// Report a stage, ignoring a closed receiver.
pub fn report(stages: &StageSender, stage: InvocationStage) {
    let _ = stages.send(stage);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Where in the round trip an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStage {
    Connect,
    Prepare,
    Execute,
    Harvest,
}

impl std::fmt::Display for BackendStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendStage::Connect => "connect",
            BackendStage::Prepare => "prepare",
            BackendStage::Execute => "execute",
            BackendStage::Harvest => "harvest",
        };
        f.write_str(s)
    }
}

/// A failed backend round trip carrying the raw driver message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub stage: BackendStage,
    pub message: String,
}

impl BackendError {
    pub fn new(stage: BackendStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(BackendStage::Connect, message)
    }

    pub fn prepare(message: impl Into<String>) -> Self {
        Self::new(BackendStage::Prepare, message)
    }

    pub fn execute(message: impl Into<String>) -> Self {
        Self::new(BackendStage::Execute, message)
    }

    pub fn harvest(message: impl Into<String>) -> Self {
        Self::new(BackendStage::Harvest, message)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Executes a prepared [`CallPlan`] against the backend.
///
/// Implementations perform exactly one round trip per call and never retry.
/// Stages after [`InvocationStage::Bound`] are reported on `stages` as they
/// are reached.
#[async_trait]
pub trait ProcedureInvoker: Send + Sync {
    async fn invoke(&self, plan: CallPlan, stages: StageSender) -> Result<OutValues, BackendError>;

    /// Verify that the backend answers.
    async fn ping(&self) -> Result<(), BackendError>;
}
