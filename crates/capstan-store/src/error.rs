use thiserror::Error;

/// Errors surfaced by the object store.
///
/// NotFound and AlreadyExists are part of normal control flow (deletion
/// races, idempotent creates); everything else propagates up for requeue.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{kind} '{namespace}/{name}' not found")]
  NotFound {
    kind: &'static str,
    namespace: String,
    name: String,
  },

  #[error("{kind} '{namespace}/{name}' already exists")]
  AlreadyExists {
    kind: &'static str,
    namespace: String,
    name: String,
  },

  #[error(
    "conflict writing {kind} '{namespace}/{name}': resource version {given} is stale (current {current})"
  )]
  Conflict {
    kind: &'static str,
    namespace: String,
    name: String,
    given: u64,
    current: u64,
  },

  #[error("store backend error: {message}")]
  Internal { message: String },
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound { .. })
  }

  pub fn is_already_exists(&self) -> bool {
    matches!(self, StoreError::AlreadyExists { .. })
  }

  pub fn is_conflict(&self) -> bool {
    matches!(self, StoreError::Conflict { .. })
  }
}
