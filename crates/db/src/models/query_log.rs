use oragate_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `query_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueryLogRow {
    pub log_id: String,
    pub query_type: String,
    pub query_text: String,
    pub params: Option<serde_json::Value>,
    pub execution_time: Timestamp,
    pub duration: String,
    pub rows_affected: i64,
    pub success: bool,
    pub error_msg: Option<String>,
    pub user_ip: Option<String>,
    pub created_at: Timestamp,
}
