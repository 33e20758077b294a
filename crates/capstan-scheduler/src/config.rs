/// Ordering policy applied to admission candidates.
///
/// FIFO is the only implemented policy; Priority and FairShare are reserved
/// and currently behave as FIFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
  #[default]
  Fifo,
  Priority,
  FairShare,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  pub policy: Policy,
  /// Upper bound on workflows with active tasks. Reserved for fair-share.
  pub max_concurrent_workflows: usize,
  /// Upper bound on a workflow's tasks in Pending or Running at once.
  pub max_active_tasks: usize,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      policy: Policy::Fifo,
      max_concurrent_workflows: 100,
      max_active_tasks: 10,
    }
  }
}

/// Task identity handed to point queries like
/// [`Scheduler::can_schedule`](crate::Scheduler::can_schedule).
#[derive(Debug, Clone)]
pub struct TaskInfo {
  pub workflow: String,
  pub task: String,
  /// Reserved for the Priority policy.
  pub priority: i32,
}
