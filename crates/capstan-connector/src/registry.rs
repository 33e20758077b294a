use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use capstan_api::TaskKind;

use crate::connector::{ResourceConnector, ServiceConnector};
use crate::error::ConnectorError;

/// Dual-map registry for the two connector shapes.
///
/// Same concurrency discipline as the executor registry: registration at
/// startup under the write lock, steady-state lookups under the read lock.
#[derive(Default)]
pub struct ConnectorRegistry {
  resource: RwLock<HashMap<TaskKind, Arc<dyn ResourceConnector>>>,
  service: RwLock<HashMap<TaskKind, Arc<dyn ServiceConnector>>>,
}

impl ConnectorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_resource(&self, connector: Arc<dyn ResourceConnector>) {
    let mut resource = self.resource.write().unwrap_or_else(|e| e.into_inner());
    resource.insert(connector.kind(), connector);
  }

  pub fn register_service(&self, connector: Arc<dyn ServiceConnector>) {
    let mut service = self.service.write().unwrap_or_else(|e| e.into_inner());
    service.insert(connector.kind(), connector);
  }

  pub fn get_resource(&self, kind: &TaskKind) -> Result<Arc<dyn ResourceConnector>, ConnectorError> {
    let resource = self.resource.read().unwrap_or_else(|e| e.into_inner());
    resource
      .get(kind)
      .cloned()
      .ok_or_else(|| ConnectorError::UnknownKind { kind: kind.clone() })
  }

  pub fn get_service(&self, kind: &TaskKind) -> Result<Arc<dyn ServiceConnector>, ConnectorError> {
    let service = self.service.read().unwrap_or_else(|e| e.into_inner());
    service
      .get(kind)
      .cloned()
      .ok_or_else(|| ConnectorError::UnknownKind { kind: kind.clone() })
  }

  pub fn has_resource(&self, kind: &TaskKind) -> bool {
    let resource = self.resource.read().unwrap_or_else(|e| e.into_inner());
    resource.contains_key(kind)
  }

  pub fn has_service(&self, kind: &TaskKind) -> bool {
    let service = self.service.read().unwrap_or_else(|e| e.into_inner());
    service.contains_key(kind)
  }

  /// True if either map can handle the kind.
  pub fn has(&self, kind: &TaskKind) -> bool {
    self.has_resource(kind) || self.has_service(kind)
  }

  pub fn resource_kinds(&self) -> Vec<TaskKind> {
    let resource = self.resource.read().unwrap_or_else(|e| e.into_inner());
    resource.keys().cloned().collect()
  }

  pub fn service_kinds(&self) -> Vec<TaskKind> {
    let service = self.service.read().unwrap_or_else(|e| e.into_inner());
    service.keys().cloned().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use capstan_api::{ExternalResource, ObjectMeta, TaskSpec, TaskState, Workflow};
  use capstan_store::Store;

  struct MockResourceConnector {
    kind: TaskKind,
  }

  #[async_trait]
  impl ResourceConnector for MockResourceConnector {
    fn kind(&self) -> TaskKind {
      self.kind.clone()
    }

    fn build_resource(
      &self,
      workflow: &Workflow,
      task: &TaskSpec,
    ) -> Result<ExternalResource, ConnectorError> {
      Ok(ExternalResource {
        api_version: "training.example.com/v1".to_string(),
        kind: "TrainingJob".to_string(),
        metadata: ObjectMeta::new(workflow.namespace(), format!("{}-{}", workflow.name(), task.name)),
        body: serde_json::Value::Null,
      })
    }

    async fn observe(
      &self,
      _store: &dyn Store,
      _workflow: &Workflow,
      _task: &TaskSpec,
    ) -> Result<TaskState, ConnectorError> {
      Ok(TaskState::Completed)
    }

    async fn cleanup(
      &self,
      _store: &dyn Store,
      _workflow: &Workflow,
      _task: &TaskSpec,
    ) -> Result<(), ConnectorError> {
      Ok(())
    }
  }

  struct MockServiceConnector {
    kind: TaskKind,
  }

  #[async_trait]
  impl ServiceConnector for MockServiceConnector {
    fn kind(&self) -> TaskKind {
      self.kind.clone()
    }

    async fn submit(
      &self,
      _workflow: &Workflow,
      _task: &TaskSpec,
    ) -> Result<String, ConnectorError> {
      Ok("job-123".to_string())
    }

    async fn observe(&self, _job_id: &str) -> Result<TaskState, ConnectorError> {
      Ok(TaskState::Completed)
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), ConnectorError> {
      Ok(())
    }
  }

  #[test]
  fn test_register_resource_connector() {
    let registry = ConnectorRegistry::new();
    registry.register_resource(Arc::new(MockResourceConnector {
      kind: TaskKind::new("kubeflow/pytorchjob"),
    }));

    assert!(registry.has_resource(&TaskKind::new("kubeflow/pytorchjob")));
    assert!(!registry.has_resource(&TaskKind::new("ray/rayjob")));
    assert!(!registry.has_service(&TaskKind::new("kubeflow/pytorchjob")));
  }

  #[test]
  fn test_register_service_connector() {
    let registry = ConnectorRegistry::new();
    registry.register_service(Arc::new(MockServiceConnector {
      kind: TaskKind::new("aws/sagemaker"),
    }));

    assert!(registry.has_service(&TaskKind::new("aws/sagemaker")));
    assert!(!registry.has_service(&TaskKind::new("gcp/vertex")));
  }

  #[test]
  fn test_get_misses_with_unknown_kind() {
    let registry = ConnectorRegistry::new();

    let result = registry.get_resource(&TaskKind::new("kubeflow/pytorchjob"));
    assert!(matches!(result, Err(ConnectorError::UnknownKind { .. })));

    let result = registry.get_service(&TaskKind::new("aws/sagemaker"));
    assert!(matches!(result, Err(ConnectorError::UnknownKind { .. })));
  }

  #[test]
  fn test_has_spans_both_maps() {
    let registry = ConnectorRegistry::new();
    registry.register_resource(Arc::new(MockResourceConnector {
      kind: TaskKind::new("kubeflow/pytorchjob"),
    }));
    registry.register_service(Arc::new(MockServiceConnector {
      kind: TaskKind::new("aws/sagemaker"),
    }));

    assert!(registry.has(&TaskKind::new("kubeflow/pytorchjob")));
    assert!(registry.has(&TaskKind::new("aws/sagemaker")));
    assert!(!registry.has(&TaskKind::new("azure/ml")));
  }

  #[test]
  fn test_kind_listings() {
    let registry = ConnectorRegistry::new();
    registry.register_resource(Arc::new(MockResourceConnector {
      kind: TaskKind::new("kubeflow/pytorchjob"),
    }));
    registry.register_service(Arc::new(MockServiceConnector {
      kind: TaskKind::new("aws/sagemaker"),
    }));

    assert_eq!(
      registry.resource_kinds(),
      vec![TaskKind::new("kubeflow/pytorchjob")]
    );
    assert_eq!(
      registry.service_kinds(),
      vec![TaskKind::new("aws/sagemaker")]
    );
  }
}
