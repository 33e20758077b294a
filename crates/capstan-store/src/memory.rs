//! In-memory store used by tests and the demo binary.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use capstan_api::{ContainerRun, ExternalResource, Workflow, KIND_WORKFLOW};

use crate::error::StoreError;
use crate::store::Store;

const KIND_RUN: &str = "ContainerRun";
const KIND_EXTERNAL: &str = "ExternalResource";

type Key = (String, String);

#[derive(Default)]
struct Inner {
  workflows: HashMap<Key, Workflow>,
  runs: HashMap<Key, ContainerRun>,
  externals: HashMap<Key, ExternalResource>,
}

/// A [`Store`] holding everything in process memory.
///
/// Implements the same contract as the platform store: optimistic concurrency
/// on status updates and owner-cascade deletion of workflows.
#[derive(Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn key(namespace: &str, name: &str) -> Key {
  (namespace.to_string(), name.to_string())
}

fn owned_by_workflow(owner: &Option<capstan_api::OwnerReference>, workflow: &str) -> bool {
  matches!(owner, Some(o) if o.kind == KIND_WORKFLOW && o.name == workflow)
}

#[async_trait]
impl Store for MemoryStore {
  async fn create_workflow(&self, workflow: &Workflow) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(workflow.namespace(), workflow.name());
    if inner.workflows.contains_key(&k) {
      return Err(StoreError::AlreadyExists {
        kind: KIND_WORKFLOW,
        namespace: workflow.namespace().to_string(),
        name: workflow.name().to_string(),
      });
    }

    let mut stored = workflow.clone();
    stored.metadata.resource_version = 1;
    inner.workflows.insert(k, stored);
    Ok(())
  }

  async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, StoreError> {
    let inner = self.inner.read().await;
    inner
      .workflows
      .get(&key(namespace, name))
      .cloned()
      .ok_or_else(|| StoreError::NotFound {
        kind: KIND_WORKFLOW,
        namespace: namespace.to_string(),
        name: name.to_string(),
      })
  }

  async fn list_workflows(&self, namespace: &str) -> Result<Vec<Workflow>, StoreError> {
    let inner = self.inner.read().await;
    let mut workflows: Vec<Workflow> = inner
      .workflows
      .values()
      .filter(|w| w.namespace() == namespace)
      .cloned()
      .collect();
    workflows.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(workflows)
  }

  async fn update_status(&self, workflow: &Workflow) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(workflow.namespace(), workflow.name());
    let stored = inner.workflows.get_mut(&k).ok_or_else(|| StoreError::NotFound {
      kind: KIND_WORKFLOW,
      namespace: workflow.namespace().to_string(),
      name: workflow.name().to_string(),
    })?;

    if stored.metadata.resource_version != workflow.metadata.resource_version {
      return Err(StoreError::Conflict {
        kind: KIND_WORKFLOW,
        namespace: workflow.namespace().to_string(),
        name: workflow.name().to_string(),
        given: workflow.metadata.resource_version,
        current: stored.metadata.resource_version,
      });
    }

    stored.status = workflow.status.clone();
    stored.metadata.resource_version += 1;
    Ok(())
  }

  async fn delete_workflow(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(namespace, name);
    if inner.workflows.remove(&k).is_none() {
      return Err(StoreError::NotFound {
        kind: KIND_WORKFLOW,
        namespace: namespace.to_string(),
        name: name.to_string(),
      });
    }

    // Owner cascade: drop everything the workflow owned.
    inner
      .runs
      .retain(|(ns, _), run| ns != namespace || !owned_by_workflow(&run.metadata.owner, name));
    inner
      .externals
      .retain(|(ns, _), res| ns != namespace || !owned_by_workflow(&res.metadata.owner, name));
    Ok(())
  }

  async fn create_run(&self, run: &ContainerRun) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(&run.metadata.namespace, &run.metadata.name);
    if inner.runs.contains_key(&k) {
      return Err(StoreError::AlreadyExists {
        kind: KIND_RUN,
        namespace: run.metadata.namespace.clone(),
        name: run.metadata.name.clone(),
      });
    }

    let mut stored = run.clone();
    stored.metadata.resource_version = 1;
    inner.runs.insert(k, stored);
    Ok(())
  }

  async fn get_run(&self, namespace: &str, name: &str) -> Result<ContainerRun, StoreError> {
    let inner = self.inner.read().await;
    inner
      .runs
      .get(&key(namespace, name))
      .cloned()
      .ok_or_else(|| StoreError::NotFound {
        kind: KIND_RUN,
        namespace: namespace.to_string(),
        name: name.to_string(),
      })
  }

  async fn list_runs(&self, namespace: &str) -> Result<Vec<ContainerRun>, StoreError> {
    let inner = self.inner.read().await;
    let mut runs: Vec<ContainerRun> = inner
      .runs
      .values()
      .filter(|r| r.metadata.namespace == namespace)
      .cloned()
      .collect();
    runs.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
    Ok(runs)
  }

  async fn update_run(&self, run: &ContainerRun) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(&run.metadata.namespace, &run.metadata.name);
    let stored = inner.runs.get_mut(&k).ok_or_else(|| StoreError::NotFound {
      kind: KIND_RUN,
      namespace: run.metadata.namespace.clone(),
      name: run.metadata.name.clone(),
    })?;

    let version = stored.metadata.resource_version + 1;
    *stored = run.clone();
    stored.metadata.resource_version = version;
    Ok(())
  }

  async fn delete_run(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    if inner.runs.remove(&key(namespace, name)).is_none() {
      return Err(StoreError::NotFound {
        kind: KIND_RUN,
        namespace: namespace.to_string(),
        name: name.to_string(),
      });
    }
    Ok(())
  }

  async fn create_external(&self, resource: &ExternalResource) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    let k = key(&resource.metadata.namespace, &resource.metadata.name);
    if inner.externals.contains_key(&k) {
      return Err(StoreError::AlreadyExists {
        kind: KIND_EXTERNAL,
        namespace: resource.metadata.namespace.clone(),
        name: resource.metadata.name.clone(),
      });
    }

    let mut stored = resource.clone();
    stored.metadata.resource_version = 1;
    inner.externals.insert(k, stored);
    Ok(())
  }

  async fn get_external(
    &self,
    namespace: &str,
    name: &str,
  ) -> Result<ExternalResource, StoreError> {
    let inner = self.inner.read().await;
    inner
      .externals
      .get(&key(namespace, name))
      .cloned()
      .ok_or_else(|| StoreError::NotFound {
        kind: KIND_EXTERNAL,
        namespace: namespace.to_string(),
        name: name.to_string(),
      })
  }

  async fn delete_external(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
    let mut inner = self.inner.write().await;
    if inner.externals.remove(&key(namespace, name)).is_none() {
      return Err(StoreError::NotFound {
        kind: KIND_EXTERNAL,
        namespace: namespace.to_string(),
        name: name.to_string(),
      });
    }
    Ok(())
  }
}
