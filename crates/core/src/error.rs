/// Domain errors raised by the gateway core.
///
/// `Display` of `Validation`, `Conflict` and the auth variants yields the bare
/// message so it can be returned to callers unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn job_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Job",
            id: id.into(),
        }
    }
}
