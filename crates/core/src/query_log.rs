//! Audit record written for every synchronous invocation attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Timestamp;

/// Query type recorded for stored-routine calls.
pub const QUERY_TYPE_PROCEDURE: &str = "PROCEDURE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLog {
    pub id: String,
    pub query_type: String,
    /// Generated call text, or the routine name when no text was built.
    pub query_text: String,
    pub params: Option<Value>,
    pub execution_time: Timestamp,
    pub duration: String,
    /// Number of OUT values harvested.
    pub rows_affected: i64,
    pub success: bool,
    pub error_msg: Option<String>,
    pub user_ip: Option<String>,
}

impl QueryLog {
    /// Record for a procedure or function call.
    pub fn procedure(
        query_text: impl Into<String>,
        params: Option<Value>,
        execution_time: Timestamp,
        duration: String,
        user_ip: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            query_type: QUERY_TYPE_PROCEDURE.to_string(),
            query_text: query_text.into(),
            params,
            execution_time,
            duration,
            rows_affected: 0,
            success: false,
            error_msg: None,
            user_ip,
        }
    }

    pub fn succeeded(mut self, out_count: usize) -> Self {
        self.success = true;
        self.rows_affected = out_count as i64;
        self.error_msg = None;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error_msg = Some(error.into());
        self
    }
}
