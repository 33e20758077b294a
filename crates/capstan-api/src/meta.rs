use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity and bookkeeping shared by every stored resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
  pub namespace: String,
  pub name: String,

  /// Optimistic-concurrency token. Bumped by the store on every write; a
  /// status update carrying a stale version is rejected with a conflict.
  #[serde(skip_serializing_if = "is_zero")]
  pub resource_version: u64,

  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,

  /// Owning resource. Deletion of the owner cascades to this resource.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub owner: Option<OwnerReference>,
}

impl ObjectMeta {
  pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      namespace: namespace.into(),
      name: name.into(),
      ..Self::default()
    }
  }
}

/// Reference from an owned resource back to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
  pub kind: String,
  pub name: String,
}

fn is_zero(v: &u64) -> bool {
  *v == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_meta_round_trip_omits_empty_fields() {
    let meta = ObjectMeta::new("default", "wf");
    let json = serde_json::to_value(&meta).unwrap();

    assert_eq!(json["namespace"], "default");
    assert_eq!(json["name"], "wf");
    assert!(json.get("resourceVersion").is_none());
    assert!(json.get("labels").is_none());
    assert!(json.get("owner").is_none());
  }

  #[test]
  fn test_meta_resource_version_serialized_when_set() {
    let mut meta = ObjectMeta::new("default", "wf");
    meta.resource_version = 3;

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["resourceVersion"], 3);
  }
}
