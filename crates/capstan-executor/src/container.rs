//! The built-in executor: one task, one short-lived container run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use capstan_api::{
  run_name, ContainerRun, ContainerRunSpec, EnvVar, ObjectMeta, OwnerReference, RestartPolicy,
  RunPhase, TaskKind, TaskSpec, TaskState, Workflow, APP_NAME, ENV_TASK_KIND, ENV_TASK_NAME,
  KIND_WORKFLOW, LABEL_APP_NAME, LABEL_APP_PART_OF, LABEL_TASK, LABEL_WORKFLOW,
};
use capstan_store::Store;

use crate::error::ExecutorError;
use crate::executor::Executor;

const DEFAULT_SHELL_IMAGE: &str = "ubuntu:24.04";
const DEFAULT_PYTHON_IMAGE: &str = "python:3.12-slim";
const DEFAULT_GO_IMAGE: &str = "golang:1.22-alpine";

/// Runs Shell, Python and Go tasks as container runs on the platform.
pub struct ContainerExecutor {
  store: Arc<dyn Store>,
}

impl ContainerExecutor {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  /// Translate a task definition into the container run to create.
  fn build_run(&self, workflow: &Workflow, task: &TaskSpec) -> ContainerRun {
    let (image, command, args) = container_spec(task);

    let mut metadata = ObjectMeta::new(workflow.namespace(), run_name(workflow.name(), &task.name));
    metadata.labels.insert(
      LABEL_WORKFLOW.to_string(),
      workflow.name().to_string(),
    );
    metadata
      .labels
      .insert(LABEL_TASK.to_string(), task.name.clone());
    metadata
      .labels
      .insert(LABEL_APP_NAME.to_string(), APP_NAME.to_string());
    metadata
      .labels
      .insert(LABEL_APP_PART_OF.to_string(), APP_NAME.to_string());
    // Deleting the workflow cascades to this run.
    metadata.owner = Some(OwnerReference {
      kind: KIND_WORKFLOW.to_string(),
      name: workflow.name().to_string(),
    });

    ContainerRun {
      metadata,
      spec: ContainerRunSpec {
        image,
        command,
        args,
        env: build_env(task),
        restart_policy: RestartPolicy::Never,
      },
      status: Default::default(),
    }
  }
}

#[async_trait]
impl Executor for ContainerExecutor {
  fn kinds(&self) -> Vec<TaskKind> {
    vec![TaskKind::shell(), TaskKind::python(), TaskKind::go()]
  }

  #[instrument(name = "executor_execute", skip_all, fields(workflow = %workflow.name(), task = %task.name))]
  async fn execute(&self, workflow: &Workflow, task: &TaskSpec) -> Result<(), ExecutorError> {
    let run = self.build_run(workflow, task);

    match self.store.create_run(&run).await {
      Ok(()) => {
        info!(resource = %run.metadata.name, "created container run");
        Ok(())
      }
      // The run already exists: a previous tick (or a controller that died
      // before persisting status) created it. That is success.
      Err(e) if e.is_already_exists() => Ok(()),
      Err(e) => Err(ExecutorError::Launch {
        task: task.name.clone(),
        source: e,
      }),
    }
  }

  async fn observe(
    &self,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<TaskState, ExecutorError> {
    let name = run_name(workflow.name(), &task.name);

    match self.store.get_run(workflow.namespace(), &name).await {
      Ok(run) => Ok(task_state_for(run.status.phase)),
      Err(e) if e.is_not_found() => Ok(TaskState::Pending),
      Err(e) => Err(ExecutorError::Observe {
        task: task.name.clone(),
        source: e,
      }),
    }
  }

  async fn cleanup(&self, workflow: &Workflow, task: &TaskSpec) -> Result<(), ExecutorError> {
    let name = run_name(workflow.name(), &task.name);

    match self.store.delete_run(workflow.namespace(), &name).await {
      Ok(()) => Ok(()),
      Err(e) if e.is_not_found() => Ok(()),
      Err(e) => Err(ExecutorError::Cleanup {
        task: task.name.clone(),
        source: e,
      }),
    }
  }
}

/// Image, command and args for a task, selected by kind.
///
/// A user-supplied image overrides the default, but the entrypoint stays
/// kind-driven.
fn container_spec(task: &TaskSpec) -> (String, Vec<String>, Vec<String>) {
  let override_image = task.image.clone();

  match task.kind.as_str() {
    TaskKind::SHELL => (
      override_image.unwrap_or_else(|| DEFAULT_SHELL_IMAGE.to_string()),
      vec!["/bin/bash".to_string(), "-c".to_string()],
      vec![task.command.clone().unwrap_or_default()],
    ),
    TaskKind::PYTHON => (
      override_image.unwrap_or_else(|| DEFAULT_PYTHON_IMAGE.to_string()),
      vec!["python".to_string(), "-c".to_string()],
      vec![task.script.clone().unwrap_or_default()],
    ),
    TaskKind::GO => {
      // Go has no `-c`: write the script to a file, set up a module and run it.
      let script = task.script.clone().unwrap_or_default();
      let fragment = format!(
        "echo '{}' > main.go && go mod init task && go mod tidy && go run main.go",
        script
      );
      (
        override_image.unwrap_or_else(|| DEFAULT_GO_IMAGE.to_string()),
        vec!["/bin/sh".to_string(), "-c".to_string()],
        vec![fragment],
      )
    }
    _ => (override_image.unwrap_or_default(), Vec::new(), Vec::new()),
  }
}

fn build_env(task: &TaskSpec) -> Vec<EnvVar> {
  let mut env = vec![
    EnvVar {
      name: ENV_TASK_NAME.to_string(),
      value: task.name.clone(),
    },
    EnvVar {
      name: ENV_TASK_KIND.to_string(),
      value: task.kind.as_str().to_string(),
    },
  ];
  for (name, value) in &task.env {
    env.push(EnvVar {
      name: name.clone(),
      value: value.clone(),
    });
  }
  env
}

fn task_state_for(phase: RunPhase) -> TaskState {
  match phase {
    RunPhase::Succeeded => TaskState::Completed,
    RunPhase::Failed => TaskState::Failed,
    RunPhase::Running => TaskState::Running,
    RunPhase::Pending => TaskState::Pending,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use capstan_api::WorkflowSpec;
  use capstan_store::MemoryStore;

  fn test_workflow() -> Workflow {
    Workflow::new("default", "etl", WorkflowSpec::default())
  }

  fn shell_task(name: &str, command: &str) -> TaskSpec {
    TaskSpec {
      name: name.to_string(),
      kind: TaskKind::shell(),
      command: Some(command.to_string()),
      ..TaskSpec::default()
    }
  }

  fn executor() -> (ContainerExecutor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (ContainerExecutor::new(store.clone()), store)
  }

  #[test]
  fn test_build_run_shell() {
    let (exec, _) = executor();
    let run = exec.build_run(&test_workflow(), &shell_task("extract", "echo hello"));

    assert_eq!(run.metadata.name, "etl-extract");
    assert_eq!(run.spec.image, DEFAULT_SHELL_IMAGE);
    assert_eq!(run.spec.command, vec!["/bin/bash", "-c"]);
    assert_eq!(run.spec.args, vec!["echo hello"]);
    assert_eq!(run.spec.restart_policy, RestartPolicy::Never);
    assert_eq!(
      run.metadata.labels.get(LABEL_WORKFLOW).map(String::as_str),
      Some("etl")
    );
    assert_eq!(
      run.metadata.labels.get(LABEL_TASK).map(String::as_str),
      Some("extract")
    );

    let owner = run.metadata.owner.as_ref().unwrap();
    assert_eq!(owner.kind, KIND_WORKFLOW);
    assert_eq!(owner.name, "etl");
  }

  #[test]
  fn test_build_run_python() {
    let (exec, _) = executor();
    let task = TaskSpec {
      name: "transform".to_string(),
      kind: TaskKind::python(),
      script: Some("print('ok')".to_string()),
      ..TaskSpec::default()
    };

    let run = exec.build_run(&test_workflow(), &task);
    assert_eq!(run.spec.image, DEFAULT_PYTHON_IMAGE);
    assert_eq!(run.spec.command, vec!["python", "-c"]);
    assert_eq!(run.spec.args, vec!["print('ok')"]);
  }

  #[test]
  fn test_build_run_go_wraps_script() {
    let (exec, _) = executor();
    let task = TaskSpec {
      name: "compile".to_string(),
      kind: TaskKind::go(),
      script: Some("package main".to_string()),
      ..TaskSpec::default()
    };

    let run = exec.build_run(&test_workflow(), &task);
    assert_eq!(run.spec.image, DEFAULT_GO_IMAGE);
    assert_eq!(run.spec.command, vec!["/bin/sh", "-c"]);
    assert!(run.spec.args[0].contains("go run main.go"));
    assert!(run.spec.args[0].contains("package main"));
  }

  #[test]
  fn test_image_override_keeps_kind_entrypoint() {
    let (exec, _) = executor();
    let mut task = shell_task("extract", "true");
    task.image = Some("registry.local/busybox:1".to_string());

    let run = exec.build_run(&test_workflow(), &task);
    assert_eq!(run.spec.image, "registry.local/busybox:1");
    assert_eq!(run.spec.command, vec!["/bin/bash", "-c"]);
  }

  #[test]
  fn test_env_injection() {
    let (exec, _) = executor();
    let mut task = shell_task("extract", "env");
    task.env.insert("MODE".to_string(), "fast".to_string());

    let run = exec.build_run(&test_workflow(), &task);
    let env = &run.spec.env;

    assert!(env
      .iter()
      .any(|e| e.name == ENV_TASK_NAME && e.value == "extract"));
    assert!(env
      .iter()
      .any(|e| e.name == ENV_TASK_KIND && e.value == TaskKind::SHELL));
    assert!(env.iter().any(|e| e.name == "MODE" && e.value == "fast"));
  }

  #[tokio::test]
  async fn test_execute_is_idempotent() {
    let (exec, store) = executor();
    let workflow = test_workflow();
    let task = shell_task("extract", "true");

    exec.execute(&workflow, &task).await.unwrap();
    // Second execute finds the run in place and succeeds without a duplicate.
    exec.execute(&workflow, &task).await.unwrap();

    let runs = store.list_runs("default").await.unwrap();
    assert_eq!(runs.len(), 1);
  }

  #[tokio::test]
  async fn test_observe_maps_run_phases() {
    let (exec, store) = executor();
    let workflow = test_workflow();
    let task = shell_task("extract", "true");
    exec.execute(&workflow, &task).await.unwrap();

    for (phase, expected) in [
      (RunPhase::Pending, TaskState::Pending),
      (RunPhase::Running, TaskState::Running),
      (RunPhase::Succeeded, TaskState::Completed),
      (RunPhase::Failed, TaskState::Failed),
    ] {
      let mut run = store.get_run("default", "etl-extract").await.unwrap();
      run.status.phase = phase;
      store.update_run(&run).await.unwrap();

      assert_eq!(exec.observe(&workflow, &task).await.unwrap(), expected);
    }
  }

  #[tokio::test]
  async fn test_observe_missing_run_is_pending() {
    let (exec, _) = executor();
    let state = exec
      .observe(&test_workflow(), &shell_task("extract", "true"))
      .await
      .unwrap();
    assert_eq!(state, TaskState::Pending);
  }

  #[tokio::test]
  async fn test_cleanup_removes_run_and_tolerates_absence() {
    let (exec, store) = executor();
    let workflow = test_workflow();
    let task = shell_task("extract", "true");

    exec.execute(&workflow, &task).await.unwrap();
    exec.cleanup(&workflow, &task).await.unwrap();
    assert!(store
      .get_run("default", "etl-extract")
      .await
      .unwrap_err()
      .is_not_found());

    // Cleaning up again is not an error.
    exec.cleanup(&workflow, &task).await.unwrap();
  }
}
