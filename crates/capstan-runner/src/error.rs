use capstan_executor::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
  /// Registry miss for the task's kind.
  #[error(transparent)]
  UnknownKind(ExecutorError),

  /// The executor refused to create the task's resources.
  #[error("task '{task}' failed to launch: {source}")]
  Launch {
    task: String,
    #[source]
    source: ExecutorError,
  },

  #[error("failed to observe task '{task}': {source}")]
  Observe {
    task: String,
    #[source]
    source: ExecutorError,
  },
}

impl RunnerError {
  pub fn is_unknown_kind(&self) -> bool {
    matches!(self, RunnerError::UnknownKind(_))
  }
}
