pub mod job_repo;
pub mod query_log_repo;

pub use job_repo::JobRepo;
pub use query_log_repo::QueryLogRepo;
