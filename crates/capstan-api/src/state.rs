use std::fmt;

use serde::{Deserialize, Serialize};

/// State of an individual task, and of the workflow aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
  Pending,
  Running,
  Completed,
  Failed,
}

impl TaskState {
  /// Completed and Failed are terminal: a task never leaves them.
  pub fn is_terminal(self) -> bool {
    matches!(self, TaskState::Completed | TaskState::Failed)
  }

  /// Pending and Running count against the scheduler's active-task limit.
  pub fn is_active(self) -> bool {
    matches!(self, TaskState::Pending | TaskState::Running)
  }
}

impl fmt::Display for TaskState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TaskState::Pending => "Pending",
      TaskState::Running => "Running",
      TaskState::Completed => "Completed",
      TaskState::Failed => "Failed",
    };
    f.write_str(s)
  }
}
