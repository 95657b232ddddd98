pub mod job;
pub mod query_log;
