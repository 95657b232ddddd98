//! Async job tracking: the registry and the background runner.

pub mod registry;
pub mod runner;

pub use registry::JobRegistry;
pub use runner::JobRunner;
