//! Task admission.
//!
//! The scheduler decides, per reconciliation tick, which tasks of a workflow
//! may start now: tasks that have never been admitted, whose dependencies are
//! all Completed, up to the per-workflow concurrency limit. Readiness is
//! derived from the workflow's own status so the decision survives controller
//! restarts; the in-memory counters only exist for future cross-workflow
//! policies.

mod config;
mod default;
mod scheduler;

pub use config::{Policy, SchedulerConfig, TaskInfo};
pub use default::DefaultScheduler;
pub use scheduler::Scheduler;
