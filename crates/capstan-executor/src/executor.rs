use async_trait::async_trait;

use capstan_api::{TaskKind, TaskSpec, TaskState, Workflow};

use crate::error::ExecutorError;

/// Capability bundle that runs one task on some execution backend.
///
/// Implementations handle one or more task kinds (the built-in container
/// executor covers Shell, Python and Go).
#[async_trait]
pub trait Executor: Send + Sync {
  /// The task kinds this executor handles.
  fn kinds(&self) -> Vec<TaskKind>;

  /// Create the resources needed to run the task.
  ///
  /// Must be idempotent: if the execution resource already exists (for
  /// example after a controller restart), this is success, not an error.
  async fn execute(&self, workflow: &Workflow, task: &TaskSpec) -> Result<(), ExecutorError>;

  /// Report the task's current state.
  ///
  /// A missing execution resource maps to Pending; the reconciler will
  /// re-launch on a later tick if the task is still pre-terminal.
  async fn observe(&self, workflow: &Workflow, task: &TaskSpec)
    -> Result<TaskState, ExecutorError>;

  /// Best-effort removal of the task's resources. An absent resource is not
  /// an error; the owner reference handles most cases anyway.
  async fn cleanup(&self, workflow: &Workflow, task: &TaskSpec) -> Result<(), ExecutorError>;
}
