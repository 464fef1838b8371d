//! Job queue service module
//!
//! Persisted job state machine, the repository that owns every transition and
//! the polling worker that claims and executes pending jobs.

mod repository;
mod worker;

// Re-export public items
pub use repository::JobRepository;
pub use worker::{Worker, WorkerSettings};
