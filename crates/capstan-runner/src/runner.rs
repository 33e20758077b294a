use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use capstan_api::{run_name, TaskSpec, TaskState, Workflow};
use capstan_executor::Registry;

use crate::error::RunnerError;

/// Outcome of handing one task to its executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
  pub task_name: String,
  /// Name of the created execution resource.
  pub resource_name: String,
  /// Initial state after launch; always Pending on success.
  pub state: TaskState,
  pub message: String,
}

/// Retry handling is reserved: the fields exist so configs can carry them,
/// but the core never retries a failed task.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
  pub max_retries: u32,
  pub retry_backoff_seconds: u64,
}

impl Default for RunnerConfig {
  fn default() -> Self {
    Self {
      max_retries: 0,
      retry_backoff_seconds: 30,
    }
  }
}

/// Binds scheduler output to executors.
#[async_trait]
pub trait Runner: Send + Sync {
  /// Launch one admitted task.
  async fn run(&self, workflow: &Workflow, task: &TaskSpec) -> Result<RunResult, RunnerError>;

  /// Report the task's current state via its executor.
  async fn observe(&self, workflow: &Workflow, task: &TaskSpec)
    -> Result<TaskState, RunnerError>;
}

/// The stock runner over the executor registry.
pub struct DefaultRunner {
  executors: Arc<Registry>,
  config: RunnerConfig,
}

impl DefaultRunner {
  pub fn new(executors: Arc<Registry>, config: RunnerConfig) -> Self {
    Self { executors, config }
  }

  pub fn with_defaults(executors: Arc<Registry>) -> Self {
    Self::new(executors, RunnerConfig::default())
  }

  pub fn config(&self) -> &RunnerConfig {
    &self.config
  }
}

#[async_trait]
impl Runner for DefaultRunner {
  async fn run(&self, workflow: &Workflow, task: &TaskSpec) -> Result<RunResult, RunnerError> {
    let executor = self
      .executors
      .get(&task.kind)
      .map_err(RunnerError::UnknownKind)?;

    info!(workflow = %workflow.name(), task = %task.name, kind = %task.kind, "running task");

    executor
      .execute(workflow, task)
      .await
      .map_err(|e| RunnerError::Launch {
        task: task.name.clone(),
        source: e,
      })?;

    Ok(RunResult {
      task_name: task.name.clone(),
      resource_name: run_name(workflow.name(), &task.name),
      state: TaskState::Pending,
      message: "task started".to_string(),
    })
  }

  async fn observe(
    &self,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<TaskState, RunnerError> {
    let executor = self
      .executors
      .get(&task.kind)
      .map_err(RunnerError::UnknownKind)?;

    executor
      .observe(workflow, task)
      .await
      .map_err(|e| RunnerError::Observe {
        task: task.name.clone(),
        source: e,
      })
  }
}
