use capstan_api::TaskKind;
use capstan_store::StoreError;
use thiserror::Error;

/// Errors a reconciliation tick can return to the framework.
///
/// Everything here triggers a requeue with backoff. NotFound and
/// AlreadyExists never escape the tick; they are normal control flow.
#[derive(Debug, Error)]
pub enum ControllerError {
  #[error(transparent)]
  Store(#[from] StoreError),

  /// Neither the executor registry nor the connector registry can handle a
  /// declared task kind. The workflow stays Running and the tick keeps
  /// failing until the kind is registered.
  #[error("no executor or connector registered for task kind '{kind}'")]
  UnknownKind { kind: TaskKind },

  /// An admitted task could not be launched. The task and the workflow are
  /// marked Failed in status before this is returned.
  #[error("task '{task}' failed to launch: {message}")]
  Launch { task: String, message: String },

  /// Observation failed and the direct-resource fallback could not answer
  /// either.
  #[error("failed to observe task '{task}': {message}")]
  Observation { task: String, message: String },

  #[error("reconciliation canceled")]
  Canceled,
}
