//! The runner: the thin binder from scheduler output to executor invocation.

mod error;
mod runner;

pub use error::RunnerError;
pub use runner::{DefaultRunner, RunResult, Runner, RunnerConfig};
