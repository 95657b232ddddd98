//! Oracle backend for the oragate gateway.
//!
//! Owns the session pool and the [`OracleInvoker`], the only
//! [`ProcedureInvoker`](oragate_core::backend::ProcedureInvoker) that talks
//! to a real database.

pub mod config;
pub mod invoker;
pub mod pool;

pub use config::OracleConfig;
pub use invoker::OracleInvoker;
pub use pool::{create_pool, OraclePool};
