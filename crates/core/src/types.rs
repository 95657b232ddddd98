/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identifier of an asynchronous job (32 lowercase hex characters).
pub type JobId = String;
