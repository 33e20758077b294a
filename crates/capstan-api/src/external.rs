use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Opaque manifest materialised by an external-resource connector.
///
/// The controller never interprets the body; it only creates the resource
/// with the deterministic name and owner reference, and asks the connector
/// to map its state back to a task state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResource {
  pub api_version: String,
  pub kind: String,
  #[serde(default)]
  pub metadata: ObjectMeta,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub body: serde_json::Value,
}
