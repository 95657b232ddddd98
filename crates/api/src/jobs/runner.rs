//! Background execution of async procedure calls.
//!
//! Each dispatched call runs on its own task behind a panic boundary. The
//! task records checkpoints on the registry as the executor reports stages,
//! then finalizes the job as completed or failed.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use oragate_core::backend::{stage_channel, InvocationStage, ProcedureInvoker};
use oragate_core::engine::run_call;
use oragate_core::job::{new_job_id, AsyncJob};
use oragate_core::procedure::ProcedureCall;

use crate::jobs::registry::JobRegistry;

/// Spawns one background task per async call.
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    invoker: Arc<dyn ProcedureInvoker>,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>, invoker: Arc<dyn ProcedureInvoker>) -> Self {
        Self { registry, invoker }
    }

    /// Create a pending job for `call` and start running it.
    ///
    /// Returns as soon as the job is registered; the invocation continues in
    /// the background.
    pub async fn dispatch(&self, call: ProcedureCall) -> AsyncJob {
        let job = AsyncJob::new(new_job_id(), call.name(), Some(call.snapshot()), Utc::now());
        let job = self.registry.create(job).await;

        tracing::info!(job_id = %job.id, procedure = %job.procedure_name, "Async job dispatched");

        tokio::spawn(run_guarded(
            Arc::clone(&self.registry),
            Arc::clone(&self.invoker),
            job.id.clone(),
            call,
        ));
        job
    }
}

/// Run a job, converting a panic anywhere in it into a failed job.
async fn run_guarded(
    registry: Arc<JobRegistry>,
    invoker: Arc<dyn ProcedureInvoker>,
    job_id: String,
    call: ProcedureCall,
) {
    let outcome = AssertUnwindSafe(run_job(&registry, invoker.as_ref(), &job_id, &call))
        .catch_unwind()
        .await;

    if let Err(panic) = outcome {
        let message = panic_message(panic.as_ref());
        tracing::error!(job_id = %job_id, panic = %message, "Async job panicked");
        let now = Utc::now();
        if let Err(e) = registry
            .update(&job_id, |job| job.fail(format!("Recovered panic: {message}"), now))
            .await
        {
            tracing::warn!(job_id = %job_id, error = %e, "Could not record panic on job");
        }
    }
}

async fn run_job(
    registry: &JobRegistry,
    invoker: &dyn ProcedureInvoker,
    job_id: &str,
    call: &ProcedureCall,
) {
    if let Err(e) = registry.update(job_id, AsyncJob::mark_running).await {
        tracing::warn!(job_id = %job_id, error = %e, "Async job vanished before start");
        return;
    }

    let (stages_tx, mut stages_rx) = stage_channel();
    let invocation = run_call(invoker, call, stages_tx);
    tokio::pin!(invocation);

    let result = loop {
        tokio::select! {
            biased;
            Some(stage) = stages_rx.recv() => checkpoint(registry, job_id, stage).await,
            result = &mut invocation => break result,
        }
    };
    while let Ok(stage) = stages_rx.try_recv() {
        checkpoint(registry, job_id, stage).await;
    }

    let now = Utc::now();
    let finalized = match result {
        Ok(outcome) => {
            tracing::info!(job_id = %job_id, outputs = outcome.out.len(), "Async job completed");
            registry
                .update(job_id, |job| job.complete(outcome.out, now))
                .await
        }
        Err(failure) => {
            tracing::info!(job_id = %job_id, error = %failure.message, "Async job failed");
            registry
                .update(job_id, |job| job.fail(failure.message, now))
                .await
        }
    };
    if let Err(e) = finalized {
        tracing::warn!(job_id = %job_id, error = %e, "Could not finalize async job");
    }
}

async fn checkpoint(registry: &JobRegistry, job_id: &str, stage: InvocationStage) {
    let Some(progress) = stage.progress() else {
        tracing::debug!(job_id = %job_id, ?stage, "Checkpoint");
        return;
    };
    match registry.update(job_id, |job| job.advance(progress)).await {
        Ok(_) => tracing::debug!(job_id = %job_id, ?stage, progress, "Checkpoint"),
        Err(e) => tracing::debug!(job_id = %job_id, error = %e, "Checkpoint skipped"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
