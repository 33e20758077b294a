use async_trait::async_trait;

use capstan_api::{ContainerRun, ExternalResource, Workflow};

use crate::error::StoreError;

/// Typed CRUD over the resources the controller works with.
///
/// Implementations are thin clients; the store itself provides watch events,
/// optimistic concurrency, and owner-cascade deletion. Status updates go
/// through the dedicated [`Store::update_status`] endpoint and never touch
/// the spec.
#[async_trait]
pub trait Store: Send + Sync {
  // Workflow resources.
  async fn create_workflow(&self, workflow: &Workflow) -> Result<(), StoreError>;
  async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, StoreError>;
  async fn list_workflows(&self, namespace: &str) -> Result<Vec<Workflow>, StoreError>;

  /// Replace the workflow's status subresource. Fails with
  /// [`StoreError::Conflict`] if the carried resource version is stale.
  async fn update_status(&self, workflow: &Workflow) -> Result<(), StoreError>;

  /// Delete the workflow and cascade to every resource it owns.
  async fn delete_workflow(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

  // Container runs (the built-in executor's resources).
  async fn create_run(&self, run: &ContainerRun) -> Result<(), StoreError>;
  async fn get_run(&self, namespace: &str, name: &str) -> Result<ContainerRun, StoreError>;
  async fn list_runs(&self, namespace: &str) -> Result<Vec<ContainerRun>, StoreError>;
  async fn update_run(&self, run: &ContainerRun) -> Result<(), StoreError>;
  async fn delete_run(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

  // Opaque resources materialised by external-resource connectors.
  async fn create_external(&self, resource: &ExternalResource) -> Result<(), StoreError>;
  async fn get_external(&self, namespace: &str, name: &str)
    -> Result<ExternalResource, StoreError>;
  async fn delete_external(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}
