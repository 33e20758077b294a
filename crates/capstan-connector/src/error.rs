use capstan_api::TaskKind;
use capstan_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
  #[error("no connector registered for task kind '{kind}'")]
  UnknownKind { kind: TaskKind },

  /// The connector could not build or submit the task's backing job.
  #[error("connector failed to launch task '{task}': {message}")]
  Launch { task: String, message: String },

  /// Transient failure reading backend state.
  #[error("connector failed to observe '{subject}': {message}")]
  Observe { subject: String, message: String },

  #[error(transparent)]
  Store(#[from] StoreError),
}
