//! Admission-time validation of workflow specs.
//!
//! The control loop itself is permissive: a task referencing a missing or
//! cyclic dependency simply never becomes ready. Callers validate specs
//! before admitting them so that mistake surfaces as an error instead of a
//! silently stuck workflow.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::kind::TaskKind;
use crate::workflow::WorkflowSpec;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
  #[error("duplicate task name '{name}'")]
  DuplicateTask { name: String },

  #[error("task '{task}' depends on unknown task '{dependency}'")]
  UnknownDependency { task: String, dependency: String },

  #[error("dependency cycle through task '{task}'")]
  DependencyCycle { task: String },

  #[error("task '{name}' has kind '{kind}' but no command")]
  MissingCommand { name: String, kind: TaskKind },

  #[error("task '{name}' has kind '{kind}' but no script")]
  MissingScript { name: String, kind: TaskKind },
}

/// Check a spec for the mistakes the control loop will not catch.
pub fn validate_workflow(spec: &WorkflowSpec) -> Result<(), ValidationError> {
  let mut names = HashSet::new();
  for task in &spec.tasks {
    if !names.insert(task.name.as_str()) {
      return Err(ValidationError::DuplicateTask {
        name: task.name.clone(),
      });
    }
  }

  for task in &spec.tasks {
    for dep in &task.dependencies {
      if !names.contains(dep.as_str()) {
        return Err(ValidationError::UnknownDependency {
          task: task.name.clone(),
          dependency: dep.clone(),
        });
      }
    }

    match task.kind.as_str() {
      TaskKind::SHELL if task.command.is_none() => {
        return Err(ValidationError::MissingCommand {
          name: task.name.clone(),
          kind: task.kind.clone(),
        });
      }
      TaskKind::PYTHON | TaskKind::GO if task.script.is_none() => {
        return Err(ValidationError::MissingScript {
          name: task.name.clone(),
          kind: task.kind.clone(),
        });
      }
      _ => {}
    }
  }

  check_acyclic(spec)
}

/// Depth-first search over the dependency edges with tri-state marking.
fn check_acyclic(spec: &WorkflowSpec) -> Result<(), ValidationError> {
  #[derive(Clone, Copy, PartialEq)]
  enum Mark {
    InProgress,
    Done,
  }

  let deps: HashMap<&str, &[String]> = spec
    .tasks
    .iter()
    .map(|t| (t.name.as_str(), t.dependencies.as_slice()))
    .collect();

  fn visit<'a>(
    name: &'a str,
    deps: &HashMap<&'a str, &'a [String]>,
    marks: &mut HashMap<&'a str, Mark>,
  ) -> Result<(), ValidationError> {
    match marks.get(name) {
      Some(Mark::Done) => return Ok(()),
      Some(Mark::InProgress) => {
        return Err(ValidationError::DependencyCycle {
          task: name.to_string(),
        });
      }
      None => {}
    }

    marks.insert(name, Mark::InProgress);
    if let Some(ds) = deps.get(name) {
      for dep in ds.iter() {
        visit(dep.as_str(), deps, marks)?;
      }
    }
    marks.insert(name, Mark::Done);
    Ok(())
  }

  let mut marks = HashMap::new();
  for task in &spec.tasks {
    visit(task.name.as_str(), &deps, &mut marks)?;
  }
  Ok(())
}
