use capstan_api::{TaskSpec, Workflow};

use crate::config::{Policy, TaskInfo};

/// The admission decision-maker.
///
/// Implementations must derive readiness from the workflow's status, never
/// from their own counters — counters are lost on restart, status is not.
pub trait Scheduler: Send + Sync {
  fn name(&self) -> &str;

  fn policy(&self) -> Policy;

  /// The tasks admissible in this tick, in admission order.
  fn schedule(&self, workflow: &Workflow) -> Vec<TaskSpec>;

  /// Point query: is there any global capacity left? Used by connectors and
  /// tests; the per-workflow admission decision does not depend on it.
  fn can_schedule(&self, task: &TaskInfo) -> bool;

  /// Called by the reconciler immediately before a task is launched.
  fn notify_task_started(&self, workflow: &str, task: &str);

  /// Called by the reconciler when a task reaches a terminal state.
  fn notify_task_completed(&self, workflow: &str, task: &str);
}
