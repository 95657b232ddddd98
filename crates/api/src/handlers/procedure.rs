//! Handlers for synchronous and background procedure calls.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use oragate_core::backend::stage_channel;
use oragate_core::engine::run_call;
use oragate_core::error::CoreError;
use oragate_core::job::format_duration;
use oragate_core::procedure::{ParameterDescriptor, ProcedureCall};
use oragate_core::query_log::QueryLog;
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ClientIp;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// Body of `POST /procedure` and `POST /procedure/async`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureRequest {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing field 'name'"))]
    pub name: String,
    #[serde(default)]
    pub is_function: bool,
    #[serde(default)]
    pub params: Vec<ParameterDescriptor>,
}

impl ProcedureRequest {
    fn into_call(self) -> AppResult<ProcedureCall> {
        self.validate()
            .map_err(|errors| CoreError::Validation(validation_message(&errors)))?;
        Ok(ProcedureCall::new(
            self.schema,
            self.name,
            self.is_function,
            self.params,
        )?)
    }
}

/// First field message from `errors`, or the full report when no field
/// carries one.
fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|error| error.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| errors.to_string())
}

fn parse_body(payload: Result<Json<ProcedureRequest>, JsonRejection>) -> AppResult<ProcedureRequest> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(format!("Invalid JSON: {}", rejection.body_text())))
}

// ---------------------------------------------------------------------------
// POST /procedure
// ---------------------------------------------------------------------------

/// POST /procedure
///
/// Run the call and wait for its OUT values.
pub async fn call_procedure(
    State(state): State<AppState>,
    Extension(client_ip): Extension<ClientIp>,
    payload: Result<Json<ProcedureRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let request = parse_body(payload)?;
    let execution_time = Utc::now();
    let clock = Instant::now();
    let request_name = request.name.clone();

    let call = match request.into_call() {
        Ok(call) => call,
        Err(err) => {
            let log = QueryLog::procedure(
                request_name,
                None,
                execution_time,
                format_duration(clock.elapsed()),
                client_ip.to_option_string(),
            )
            .failed(err.to_string());
            record_query(&state, log);
            return Err(err);
        }
    };

    tracing::info!(routine = %call.qualified_name(), function = call.is_function(), "Procedure call");

    let (stages, _) = stage_channel();
    let result = run_call(state.invoker.as_ref(), &call, stages).await;
    let duration = format_duration(clock.elapsed());

    match result {
        Ok(outcome) => {
            let log = QueryLog::procedure(
                outcome.sql,
                Some(call.snapshot()),
                execution_time,
                duration,
                client_ip.to_option_string(),
            )
            .succeeded(outcome.out.len());
            record_query(&state, log);

            Ok(Json(json!({ "status": "ok", "out": outcome.out })))
        }
        Err(failure) => {
            let log = QueryLog::procedure(
                failure.sql.clone(),
                Some(call.snapshot()),
                execution_time,
                duration,
                client_ip.to_option_string(),
            )
            .failed(failure.message.clone());
            record_query(&state, log);

            Err(failure.into())
        }
    }
}

/// Fire-and-forget write to the audit log.
fn record_query(state: &AppState, log: QueryLog) {
    let Some(store) = state.query_log.as_ref().map(Arc::clone) else {
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = store.save_query_log(&log).await {
            tracing::warn!(log_id = %log.id, error = %e, "Failed to write query log");
        }
    });
}

// ---------------------------------------------------------------------------
// POST /procedure/async
// ---------------------------------------------------------------------------

/// POST /procedure/async
///
/// Validate the call, register a job and return 202 immediately. Backend
/// errors are recorded on the job, never returned here.
pub async fn call_procedure_async(
    State(state): State<AppState>,
    payload: Result<Json<ProcedureRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let call = parse_body(payload)?.into_call()?;
    let job = state.runner.dispatch(call).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "job_id": job.id,
            "message": "Procedure running in the background",
            "check_status_url": format!("/jobs/{}", job.id),
        })),
    ))
}
