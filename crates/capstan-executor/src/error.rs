use capstan_api::TaskKind;
use capstan_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
  /// Registry miss: no executor declared the task's kind.
  #[error("no executor registered for task kind '{kind}'")]
  UnknownKind { kind: TaskKind },

  /// The executor could not create the execution resource.
  #[error("failed to launch task '{task}': {source}")]
  Launch {
    task: String,
    #[source]
    source: StoreError,
  },

  /// Transient failure reading the execution resource's state.
  #[error("failed to observe task '{task}': {source}")]
  Observe {
    task: String,
    #[source]
    source: StoreError,
  },

  /// Best-effort cleanup failed for a reason other than absence.
  #[error("failed to clean up task '{task}': {source}")]
  Cleanup {
    task: String,
    #[source]
    source: StoreError,
  },
}
