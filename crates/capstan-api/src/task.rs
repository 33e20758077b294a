use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kind::TaskKind;
use crate::state::TaskState;

/// One node of the workflow DAG, as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
  /// Unique within the workflow.
  pub name: String,
  pub kind: TaskKind,

  /// Tasks that must be Completed before this task may start.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<String>,

  /// Shell command, for the Shell kind.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,

  /// Inline script, for the embedded-language kinds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub script: Option<String>,

  /// Container image override. Entrypoint selection stays kind-driven.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
}

/// Controller-owned record of one task's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
  pub name: String,
  pub state: TaskState,

  /// Identity of the underlying execution resource, or the job id reported
  /// by a cloud-service connector.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub resource_name: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub message: String,
}
