use async_trait::async_trait;

use capstan_api::{ExternalResource, TaskKind, TaskSpec, TaskState, Workflow};
use capstan_store::Store;

use crate::error::ConnectorError;

/// A connector whose backend is itself a resource in the object store.
///
/// The reconciler creates the built manifest under the deterministic
/// `{workflow}-{task}` name with an owner reference, then asks the connector
/// to map the resource's state back to a task state.
#[async_trait]
pub trait ResourceConnector: Send + Sync {
  /// The vendor-prefixed kind this connector handles, e.g.
  /// `kubeflow/pytorchjob`.
  fn kind(&self) -> TaskKind;

  /// Build the opaque resource manifest for a task.
  fn build_resource(
    &self,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<ExternalResource, ConnectorError>;

  /// Map the backing resource's state to a task state. A missing resource
  /// maps to Pending.
  async fn observe(
    &self,
    store: &dyn Store,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<TaskState, ConnectorError>;

  /// Best-effort deletion; the owner reference covers the common case.
  async fn cleanup(
    &self,
    store: &dyn Store,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<(), ConnectorError>;
}

/// A connector for out-of-cluster execution services.
///
/// Jobs are addressed by the id returned from [`ServiceConnector::submit`];
/// the reconciler records that id as the task's resource name.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
  /// The vendor-prefixed kind this connector handles, e.g. `aws/sagemaker`.
  fn kind(&self) -> TaskKind;

  /// Submit the task to the service, returning the job id.
  async fn submit(&self, workflow: &Workflow, task: &TaskSpec) -> Result<String, ConnectorError>;

  /// Map the job's state to a task state.
  async fn observe(&self, job_id: &str) -> Result<TaskState, ConnectorError>;

  /// Cancel a running job.
  async fn cancel(&self, job_id: &str) -> Result<(), ConnectorError>;
}
