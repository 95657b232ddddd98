//! Invocation executor backed by the `oracle` driver.
//!
//! The driver is blocking, so every round trip runs on the blocking thread
//! pool. Stage events are sent from that thread as the call progresses.

use async_trait::async_trait;
use oracle::sql_type::OracleType;
use oracle::{Connection, Statement};
use serde_json::Value;

use oragate_core::backend::{
    report, BackendError, InvocationStage, OutValues, ProcedureInvoker, StageSender,
};
use oragate_core::binding::{BindSlot, BindValue, OutBinding, OutKind, OUT_TEXT_CAPACITY};
use oragate_core::call_builder::CallPlan;

use crate::pool::OraclePool;

/// [`ProcedureInvoker`] running calls on pooled Oracle sessions.
#[derive(Clone)]
pub struct OracleInvoker {
    pool: OraclePool,
}

impl OracleInvoker {
    pub fn new(pool: OraclePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcedureInvoker for OracleInvoker {
    async fn invoke(&self, plan: CallPlan, stages: StageSender) -> Result<OutValues, BackendError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| BackendError::connect(e.to_string()))?;
            execute_plan(&conn, &plan, &stages)
        })
        .await
        .map_err(|e| BackendError::execute(format!("Invocation task aborted: {e}")))?
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| BackendError::connect(e.to_string()))?;
            conn.ping()
                .map_err(|e| BackendError::execute(e.to_string()))
        })
        .await
        .map_err(|e| BackendError::execute(format!("Ping task aborted: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

/// Prepare, bind, execute and harvest one call on `conn`.
fn execute_plan(
    conn: &Connection,
    plan: &CallPlan,
    stages: &StageSender,
) -> Result<OutValues, BackendError> {
    let mut stmt = conn
        .statement(&plan.sql)
        .build()
        .map_err(|e| BackendError::prepare(e.to_string()))?;

    let blank = OutBinding::blank_text_buffer();
    for (i, slot) in plan.slots.iter().enumerate() {
        bind_slot(&mut stmt, i + 1, slot, &blank)
            .map_err(|e| BackendError::prepare(e.to_string()))?;
    }
    report(stages, InvocationStage::Prepared);

    report(stages, InvocationStage::Executing);
    if let Err(e) = stmt.execute(&[]) {
        let _ = conn.rollback();
        return Err(BackendError::execute(e.to_string()));
    }
    conn.commit()
        .map_err(|e| BackendError::execute(e.to_string()))?;

    let out = harvest(&stmt, plan).map_err(|e| BackendError::harvest(e.to_string()))?;
    report(stages, InvocationStage::Harvested);

    tracing::debug!(outputs = out.len(), "Call executed");
    Ok(out)
}

/// Bind one slot at 1-based position `pos`.
#[allow(clippy::ptr_arg)]
fn bind_slot(
    stmt: &mut Statement,
    pos: usize,
    slot: &BindSlot,
    blank: &String,
) -> Result<(), oracle::Error> {
    match slot {
        BindSlot::Out(out) => match out.kind {
            OutKind::Numeric => stmt.bind(pos, &OracleType::Number(0, 0)),
            OutKind::Textual => {
                let oratype = OracleType::Varchar2(OUT_TEXT_CAPACITY as u32);
                stmt.bind(pos, &(blank, &oratype))
            }
        },
        BindSlot::In(value) => match value {
            BindValue::Null => stmt.bind(pos, &None::<String>),
            BindValue::Bool(b) => stmt.bind(pos, &i64::from(*b)),
            BindValue::Integer(i) => stmt.bind(pos, i),
            BindValue::Float(f) => stmt.bind(pos, f),
            BindValue::Text(s) => stmt.bind(pos, s),
            BindValue::Date(d) => stmt.bind(pos, d),
        },
    }
}

/// Read every OUT destination back into a name -> value map.
fn harvest(stmt: &Statement, plan: &CallPlan) -> Result<OutValues, oracle::Error> {
    let mut out = OutValues::new();
    for binding in plan.outputs() {
        let pos = binding.slot_index + 1;
        let value = match binding.kind {
            OutKind::Numeric => numeric_value(stmt.bind_value(pos)?),
            OutKind::Textual => text_value(stmt.bind_value(pos)?),
        };
        out.insert(binding.name.clone(), value);
    }
    Ok(out)
}

fn numeric_value(raw: Option<f64>) -> Value {
    raw.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Textual destinations are returned verbatim; NULL becomes `""`.
fn text_value(raw: Option<String>) -> Value {
    Value::String(raw.unwrap_or_default())
}
