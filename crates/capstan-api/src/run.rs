//! The execution resource materialised by the built-in container executor.

use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

pub const LABEL_WORKFLOW: &str = "workflow";
pub const LABEL_TASK: &str = "task";
pub const LABEL_APP_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_APP_PART_OF: &str = "app.kubernetes.io/part-of";
pub const APP_NAME: &str = "capstan";

/// Injected into every task container.
pub const ENV_TASK_NAME: &str = "WF_TASK_NAME";
/// Injected for kinds that need in-container dispatch.
pub const ENV_TASK_KIND: &str = "WF_TASK_KIND";

/// Deterministic name of the execution resource for (workflow, task).
///
/// The controller relies on this to find in-flight resources after a restart;
/// it is also what makes execute idempotent.
pub fn run_name(workflow: &str, task: &str) -> String {
  format!("{}-{}", workflow, task)
}

/// A short-lived container execution scheduled on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRun {
  #[serde(default)]
  pub metadata: ObjectMeta,
  #[serde(default)]
  pub spec: ContainerRunSpec,
  #[serde(default)]
  pub status: ContainerRunStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRunSpec {
  pub image: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub command: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env: Vec<EnvVar>,
  #[serde(default)]
  pub restart_policy: RestartPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRunStatus {
  pub phase: RunPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
  pub name: String,
  pub value: String,
}

/// Task containers run exactly once; failure of the container is the task's
/// failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
  #[default]
  Never,
  OnFailure,
  Always,
}

/// Lifecycle phase reported by the container runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
  #[default]
  Pending,
  Running,
  Succeeded,
  Failed,
}

impl RunPhase {
  pub fn is_terminal(self) -> bool {
    matches!(self, RunPhase::Succeeded | RunPhase::Failed)
  }
}
