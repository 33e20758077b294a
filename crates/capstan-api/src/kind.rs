use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a task, deciding which executor or connector runs it.
///
/// Built-in kinds are bare names (`Shell`, `Python`, `Go`). Kinds carrying a
/// `vendor/` prefix (for example `aws/sagemaker`) are routed to the connector
/// registry instead of the executor registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKind(String);

impl TaskKind {
  pub const SHELL: &'static str = "Shell";
  pub const PYTHON: &'static str = "Python";
  pub const GO: &'static str = "Go";

  pub fn new(s: impl Into<String>) -> Self {
    Self(s.into())
  }

  pub fn shell() -> Self {
    Self::new(Self::SHELL)
  }

  pub fn python() -> Self {
    Self::new(Self::PYTHON)
  }

  pub fn go() -> Self {
    Self::new(Self::GO)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The vendor tag of a connector kind, if any. `aws/sagemaker` yields
  /// `Some("aws")`; built-in kinds yield `None`.
  pub fn vendor(&self) -> Option<&str> {
    self.0.split_once('/').map(|(vendor, _)| vendor)
  }
}

impl fmt::Display for TaskKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl From<&str> for TaskKind {
  fn from(s: &str) -> Self {
    Self::new(s)
  }
}

impl From<String> for TaskKind {
  fn from(s: String) -> Self {
    Self(s)
  }
}
