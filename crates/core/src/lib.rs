//! Domain logic for the oragate procedure gateway.
//!
//! Everything in this crate is independent of HTTP and of any concrete
//! database driver: the Oracle executor lives in `oragate-oracle`, the
//! persistent mirror in `oragate-db` and the HTTP surface in `oragate-api`.

pub mod backend;
pub mod binding;
pub mod call_builder;
pub mod engine;
pub mod error;
pub mod error_translator;
pub mod job;
pub mod naming;
pub mod procedure;
pub mod query_log;
pub mod store;
pub mod types;
