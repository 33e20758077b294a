use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;
use crate::state::TaskState;
use crate::task::{TaskSpec, TaskStatus};

pub const API_VERSION: &str = "workflow/v1";
pub const KIND_WORKFLOW: &str = "Workflow";

/// The user-facing workflow resource: a DAG of tasks plus the controller's
/// view of its progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
  #[serde(default = "default_api_version")]
  pub api_version: String,
  #[serde(default = "default_kind")]
  pub kind: String,
  #[serde(default)]
  pub metadata: ObjectMeta,
  #[serde(default)]
  pub spec: WorkflowSpec,
  #[serde(default)]
  pub status: WorkflowStatus,
}

impl Workflow {
  pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: WorkflowSpec) -> Self {
    Self {
      api_version: API_VERSION.to_string(),
      kind: KIND_WORKFLOW.to_string(),
      metadata: ObjectMeta::new(namespace, name),
      spec,
      status: WorkflowStatus::default(),
    }
  }

  pub fn name(&self) -> &str {
    &self.metadata.name
  }

  pub fn namespace(&self) -> &str {
    &self.metadata.namespace
  }

  /// Look up a task definition by name.
  pub fn task(&self, name: &str) -> Option<&TaskSpec> {
    self.spec.tasks.iter().find(|t| t.name == name)
  }
}

/// User-supplied side of the workflow. Immutable once admitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
  pub tasks: Vec<TaskSpec>,
}

/// Controller-owned side of the workflow.
///
/// `state` is unset until the first reconciliation, which initialises it to
/// Running. Once it reaches Completed or Failed it never changes again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowStatus {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state: Option<TaskState>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub task_statuses: Vec<TaskStatus>,
}

impl WorkflowStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self.state, Some(s) if s.is_terminal())
  }

  pub fn task(&self, name: &str) -> Option<&TaskStatus> {
    self.task_statuses.iter().find(|t| t.name == name)
  }

  pub fn task_mut(&mut self, name: &str) -> Option<&mut TaskStatus> {
    self.task_statuses.iter_mut().find(|t| t.name == name)
  }

  /// Number of records currently counting against the concurrency limit.
  pub fn active_count(&self) -> usize {
    self
      .task_statuses
      .iter()
      .filter(|t| t.state.is_active())
      .count()
  }
}

fn default_api_version() -> String {
  API_VERSION.to_string()
}

fn default_kind() -> String {
  KIND_WORKFLOW.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::kind::TaskKind;

  fn manifest() -> &'static str {
    r#"{
      "apiVersion": "workflow/v1",
      "kind": "Workflow",
      "metadata": { "namespace": "default", "name": "etl" },
      "spec": {
        "tasks": [
          { "name": "extract", "kind": "Shell", "command": "true" },
          {
            "name": "transform",
            "kind": "Python",
            "script": "print('ok')",
            "dependencies": ["extract"],
            "env": { "MODE": "fast" }
          }
        ]
      }
    }"#
  }

  #[test]
  fn test_manifest_deserializes() {
    let wf: Workflow = serde_json::from_str(manifest()).unwrap();

    assert_eq!(wf.api_version, API_VERSION);
    assert_eq!(wf.name(), "etl");
    assert_eq!(wf.namespace(), "default");
    assert_eq!(wf.spec.tasks.len(), 2);

    let transform = wf.task("transform").unwrap();
    assert_eq!(transform.kind, TaskKind::python());
    assert_eq!(transform.dependencies, vec!["extract".to_string()]);
    assert_eq!(transform.env.get("MODE").map(String::as_str), Some("fast"));
    assert!(wf.status.state.is_none());
  }

  #[test]
  fn test_status_active_count() {
    let mut status = WorkflowStatus::default();
    for (name, state) in [
      ("a", TaskState::Pending),
      ("b", TaskState::Running),
      ("c", TaskState::Completed),
      ("d", TaskState::Failed),
    ] {
      status.task_statuses.push(TaskStatus {
        name: name.to_string(),
        state,
        resource_name: String::new(),
        message: String::new(),
      });
    }

    assert_eq!(status.active_count(), 2);
    assert!(!status.is_terminal());

    status.state = Some(TaskState::Failed);
    assert!(status.is_terminal());
  }
}
