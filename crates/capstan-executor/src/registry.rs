use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use capstan_api::TaskKind;

use crate::error::ExecutorError;
use crate::executor::Executor;

/// Thread-safe mapping from task kind to executor.
///
/// Registration binds an executor to every kind it declares; a later
/// registration for the same kind replaces the earlier one. Writes happen at
/// startup, so lookups take the read side of the lock.
#[derive(Default)]
pub struct Registry {
  executors: RwLock<HashMap<TaskKind, Arc<dyn Executor>>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&self, executor: Arc<dyn Executor>) {
    let mut executors = self.executors.write().unwrap_or_else(|e| e.into_inner());
    for kind in executor.kinds() {
      executors.insert(kind, executor.clone());
    }
  }

  pub fn get(&self, kind: &TaskKind) -> Result<Arc<dyn Executor>, ExecutorError> {
    let executors = self.executors.read().unwrap_or_else(|e| e.into_inner());
    executors
      .get(kind)
      .cloned()
      .ok_or_else(|| ExecutorError::UnknownKind { kind: kind.clone() })
  }

  pub fn has(&self, kind: &TaskKind) -> bool {
    let executors = self.executors.read().unwrap_or_else(|e| e.into_inner());
    executors.contains_key(kind)
  }

  /// All registered kinds, in no particular order.
  pub fn kinds(&self) -> Vec<TaskKind> {
    let executors = self.executors.read().unwrap_or_else(|e| e.into_inner());
    executors.keys().cloned().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use capstan_api::{TaskSpec, TaskState, Workflow};

  struct MockExecutor {
    kinds: Vec<TaskKind>,
    observed: TaskState,
  }

  impl MockExecutor {
    fn new(kinds: Vec<TaskKind>) -> Self {
      Self {
        kinds,
        observed: TaskState::Completed,
      }
    }
  }

  #[async_trait]
  impl Executor for MockExecutor {
    fn kinds(&self) -> Vec<TaskKind> {
      self.kinds.clone()
    }

    async fn execute(&self, _workflow: &Workflow, _task: &TaskSpec) -> Result<(), ExecutorError> {
      Ok(())
    }

    async fn observe(
      &self,
      _workflow: &Workflow,
      _task: &TaskSpec,
    ) -> Result<TaskState, ExecutorError> {
      Ok(self.observed)
    }

    async fn cleanup(&self, _workflow: &Workflow, _task: &TaskSpec) -> Result<(), ExecutorError> {
      Ok(())
    }
  }

  #[test]
  fn test_register_binds_every_declared_kind() {
    let registry = Registry::new();
    registry.register(Arc::new(MockExecutor::new(vec![
      TaskKind::shell(),
      TaskKind::python(),
    ])));

    assert!(registry.has(&TaskKind::shell()));
    assert!(registry.has(&TaskKind::python()));
    assert!(!registry.has(&TaskKind::go()));
  }

  #[test]
  fn test_get_unregistered_kind_fails() {
    let registry = Registry::new();
    registry.register(Arc::new(MockExecutor::new(vec![TaskKind::shell()])));

    assert!(registry.get(&TaskKind::shell()).is_ok());

    let result = registry.get(&TaskKind::python());
    assert!(matches!(result, Err(ExecutorError::UnknownKind { .. })));
  }

  #[tokio::test]
  async fn test_later_registration_replaces_earlier() {
    let registry = Registry::new();
    registry.register(Arc::new(MockExecutor::new(vec![TaskKind::shell()])));
    registry.register(Arc::new(MockExecutor {
      kinds: vec![TaskKind::shell()],
      observed: TaskState::Failed,
    }));

    let workflow = Workflow::new("default", "wf", Default::default());
    let task = TaskSpec::default();
    let resolved = registry.get(&TaskKind::shell()).unwrap();
    assert_eq!(
      resolved.observe(&workflow, &task).await.unwrap(),
      TaskState::Failed
    );
  }

  #[test]
  fn test_kinds_lists_all_registrations() {
    let registry = Registry::new();
    registry.register(Arc::new(MockExecutor::new(vec![
      TaskKind::shell(),
      TaskKind::python(),
      TaskKind::go(),
    ])));

    let mut kinds = registry.kinds();
    kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(
      kinds,
      vec![TaskKind::go(), TaskKind::python(), TaskKind::shell()]
    );
  }

  #[test]
  fn test_concurrent_register_and_lookup() {
    let registry = Arc::new(Registry::new());

    let writer = {
      let registry = registry.clone();
      std::thread::spawn(move || {
        for _ in 0..100 {
          registry.register(Arc::new(MockExecutor::new(vec![TaskKind::shell()])));
        }
      })
    };

    let reader = {
      let registry = registry.clone();
      std::thread::spawn(move || {
        for _ in 0..100 {
          registry.has(&TaskKind::shell());
          registry.kinds();
        }
      })
    };

    writer.join().unwrap();
    reader.join().unwrap();
  }
}
