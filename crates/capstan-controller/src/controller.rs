use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use capstan_api::{
  run_name, OwnerReference, RunPhase, TaskKind, TaskSpec, TaskState, TaskStatus, Workflow,
  WorkflowStatus, KIND_WORKFLOW,
};
use capstan_connector::{ConnectorRegistry, ResourceConnector, ServiceConnector};
use capstan_executor::Registry;
use capstan_runner::{RunResult, Runner};
use capstan_scheduler::Scheduler;
use capstan_store::Store;

use crate::error::ControllerError;

/// Identity of a workflow in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowKey {
  pub namespace: String,
  pub name: String,
}

impl WorkflowKey {
  pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      namespace: namespace.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for WorkflowKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.namespace, self.name)
  }
}

/// What the framework should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileAction {
  requeue: bool,
}

impl ReconcileAction {
  /// The workflow is still running; reconcile again promptly.
  pub fn requeue() -> Self {
    Self { requeue: true }
  }

  /// Nothing left to do; owned-resource events will drive future ticks.
  pub fn done() -> Self {
    Self { requeue: false }
  }

  pub fn should_requeue(&self) -> bool {
    self.requeue
  }
}

/// How a task kind is executed: through the executor registry, or through
/// one of the two connector shapes for vendor-prefixed kinds.
enum Dispatch {
  Executor,
  Resource(Arc<dyn ResourceConnector>),
  Service(Arc<dyn ServiceConnector>),
}

/// One reconciliation tick per call; everything derived from observed state.
pub struct WorkflowController {
  store: Arc<dyn Store>,
  executors: Arc<Registry>,
  connectors: Arc<ConnectorRegistry>,
  scheduler: Arc<dyn Scheduler>,
  runner: Arc<dyn Runner>,
}

impl WorkflowController {
  pub fn new(
    store: Arc<dyn Store>,
    executors: Arc<Registry>,
    connectors: Arc<ConnectorRegistry>,
    scheduler: Arc<dyn Scheduler>,
    runner: Arc<dyn Runner>,
  ) -> Self {
    Self {
      store,
      executors,
      connectors,
      scheduler,
      runner,
    }
  }

  /// Run one reconciliation of the workflow identified by `key`.
  ///
  /// Nothing is persisted until the end of the tick (or a launch failure),
  /// so cancellation and errors discard only local state.
  #[instrument(name = "reconcile", skip_all, fields(workflow = %key))]
  pub async fn reconcile(
    &self,
    cancel: &CancellationToken,
    key: &WorkflowKey,
  ) -> Result<ReconcileAction, ControllerError> {
    if cancel.is_cancelled() {
      return Err(ControllerError::Canceled);
    }

    // Fetch. A missing workflow was deleted: nothing to do.
    let mut workflow = match self.store.get_workflow(&key.namespace, &key.name).await {
      Ok(workflow) => workflow,
      Err(e) if e.is_not_found() => return Ok(ReconcileAction::done()),
      Err(e) => return Err(e.into()),
    };

    // Snapshot for the no-op check: an unchanged status is not re-persisted.
    let fetched_status = workflow.status.clone();

    // Ensure status.
    if workflow.status.state.is_none() {
      workflow.status.state = Some(TaskState::Running);
    }

    // Observe: merge execution-resource state into the status records.
    self.sync_status(cancel, &mut workflow).await?;

    // Terminal short-circuit.
    if workflow.status.is_terminal() {
      self.persist(&workflow, &fetched_status).await?;
      return Ok(ReconcileAction::done());
    }

    // Re-assert execution resources for records still Pending. Execute is
    // idempotent, so a resource that vanished (or was never created because
    // the controller died between create and persist) comes back here; an
    // existing resource is untouched.
    self.relaunch_pending(cancel, &mut workflow, &fetched_status).await?;

    // Schedule.
    let admitted = self.scheduler.schedule(&workflow);

    // Launch each admitted task, in order.
    for task in &admitted {
      if cancel.is_cancelled() {
        return Err(ControllerError::Canceled);
      }

      // Resolve the backend first: a registry miss must not record anything
      // for the task (the workflow stays Running and the tick errors).
      let dispatch = match self.resolve(&task.kind) {
        Ok(dispatch) => dispatch,
        Err(e) => {
          self.persist(&workflow, &fetched_status).await?;
          return Err(e);
        }
      };

      workflow.status.task_statuses.push(TaskStatus {
        name: task.name.clone(),
        state: TaskState::Pending,
        resource_name: run_name(workflow.name(), &task.name),
        message: String::new(),
      });
      self.scheduler.notify_task_started(workflow.name(), &task.name);

      info!(task = %task.name, kind = %task.kind, "launching task");

      match self.launch(&dispatch, &workflow, task).await {
        Ok(result) => {
          let record = workflow
            .status
            .task_mut(&task.name)
            .expect("record appended above");
          record.state = result.state;
          record.resource_name = result.resource_name;
          record.message = result.message;
        }
        Err(message) => {
          return Err(
            self
              .fail_launch(&mut workflow, &fetched_status, &task.name, message)
              .await,
          );
        }
      }
    }

    // Aggregate: Completed once every spec task has a Completed record.
    self.update_aggregate(&mut workflow);

    // Persist all of this tick's changes in one write.
    self.persist(&workflow, &fetched_status).await?;

    // Requeue while running; terminal workflows rest until events arrive.
    if workflow.status.state == Some(TaskState::Running) {
      Ok(ReconcileAction::requeue())
    } else {
      Ok(ReconcileAction::done())
    }
  }

  /// Re-launch tasks whose record is Pending.
  ///
  /// Covers the restart gap: a status record without a live resource (the
  /// controller crashed after persisting, or the resource was removed out of
  /// band) is recreated through the same idempotent execute path, where an
  /// existence collision is success. Service-connector jobs are submit-once;
  /// the job id recorded in status stays authoritative for them.
  async fn relaunch_pending(
    &self,
    cancel: &CancellationToken,
    workflow: &mut Workflow,
    fetched_status: &WorkflowStatus,
  ) -> Result<(), ControllerError> {
    let pending: Vec<TaskSpec> = workflow
      .spec
      .tasks
      .iter()
      .filter(|task| {
        matches!(
          workflow.status.task(&task.name),
          Some(s) if s.state == TaskState::Pending
        )
      })
      .cloned()
      .collect();

    for task in &pending {
      if cancel.is_cancelled() {
        return Err(ControllerError::Canceled);
      }

      let dispatch = match self.resolve(&task.kind) {
        Ok(dispatch) => dispatch,
        Err(e) => {
          self.persist(workflow, fetched_status).await?;
          return Err(e);
        }
      };
      if matches!(dispatch, Dispatch::Service(_)) {
        continue;
      }

      if let Err(message) = self.launch(&dispatch, workflow, task).await {
        return Err(
          self
            .fail_launch(workflow, fetched_status, &task.name, message)
            .await,
        );
      }
    }

    Ok(())
  }

  /// Mark a task (and the workflow) Failed after a launch error, persist the
  /// user-visible failure, and build the error for the framework.
  async fn fail_launch(
    &self,
    workflow: &mut Workflow,
    fetched_status: &WorkflowStatus,
    task: &str,
    message: String,
  ) -> ControllerError {
    warn!(task = %task, error = %message, "task launch failed");

    let record = workflow
      .status
      .task_mut(task)
      .expect("launched task has a status record");
    record.state = TaskState::Failed;
    record.message = message.clone();
    workflow.status.state = Some(TaskState::Failed);
    self.scheduler.notify_task_completed(workflow.name(), task);

    // Record the failure for the user before surfacing the error.
    if let Err(e) = self.persist(workflow, fetched_status).await {
      return e;
    }
    ControllerError::Launch {
      task: task.to_string(),
      message,
    }
  }

  /// Refresh every non-terminal status record from its execution backend.
  ///
  /// A task failure flips the aggregate immediately but observation of the
  /// remaining tasks continues, so one tick captures everything it can see.
  async fn sync_status(
    &self,
    cancel: &CancellationToken,
    workflow: &mut Workflow,
  ) -> Result<(), ControllerError> {
    let tasks = workflow.spec.tasks.clone();

    for task in &tasks {
      if cancel.is_cancelled() {
        return Err(ControllerError::Canceled);
      }

      let Some(current) = workflow.status.task(&task.name) else {
        // Never admitted; nothing to observe.
        continue;
      };
      if current.state.is_terminal() {
        continue;
      }
      let recorded = current.state;
      let resource_name = current.resource_name.clone();

      let Some(observed) = self
        .observe_task(workflow, task, &resource_name)
        .await?
      else {
        continue;
      };
      if observed == recorded {
        continue;
      }

      let record = workflow
        .status
        .task_mut(&task.name)
        .expect("record checked above");
      record.state = observed;

      if observed.is_terminal() && recorded.is_active() {
        self.scheduler.notify_task_completed(workflow.name(), &task.name);
      }
      if observed == TaskState::Failed {
        workflow.status.state = Some(TaskState::Failed);
      }
    }

    Ok(())
  }

  /// Ask the task's backend for its current state.
  ///
  /// Returns `Ok(None)` when there is nothing to learn this tick (resource
  /// not found via the fallback path, job not yet submitted, or an
  /// unregistered vendor kind — the launch path surfaces that miss).
  async fn observe_task(
    &self,
    workflow: &Workflow,
    task: &TaskSpec,
    resource_name: &str,
  ) -> Result<Option<TaskState>, ControllerError> {
    if task.kind.vendor().is_some() {
      if let Ok(connector) = self.connectors.get_resource(&task.kind) {
        let state = connector
          .observe(self.store.as_ref(), workflow, task)
          .await
          .map_err(|e| ControllerError::Observation {
            task: task.name.clone(),
            message: e.to_string(),
          })?;
        return Ok(Some(state));
      }
      if let Ok(connector) = self.connectors.get_service(&task.kind) {
        if resource_name.is_empty() {
          return Ok(None);
        }
        let state = connector
          .observe(resource_name)
          .await
          .map_err(|e| ControllerError::Observation {
            task: task.name.clone(),
            message: e.to_string(),
          })?;
        return Ok(Some(state));
      }
      return Ok(None);
    }

    match self.runner.observe(workflow, task).await {
      Ok(state) => Ok(Some(state)),
      Err(e) => {
        // Fall back to reading the container run directly by its
        // deterministic name.
        warn!(task = %task.name, error = %e, "observe failed; falling back to direct lookup");
        let name = run_name(workflow.name(), &task.name);
        match self.store.get_run(workflow.namespace(), &name).await {
          Ok(run) => Ok(Some(task_state_for(run.status.phase))),
          Err(e) if e.is_not_found() => Ok(None),
          Err(e) => Err(e.into()),
        }
      }
    }
  }

  /// Pick the execution backend for a kind: connectors for vendor-prefixed
  /// kinds, the executor registry otherwise.
  fn resolve(&self, kind: &TaskKind) -> Result<Dispatch, ControllerError> {
    if kind.vendor().is_some() {
      if let Ok(connector) = self.connectors.get_resource(kind) {
        return Ok(Dispatch::Resource(connector));
      }
      if let Ok(connector) = self.connectors.get_service(kind) {
        return Ok(Dispatch::Service(connector));
      }
      return Err(ControllerError::UnknownKind { kind: kind.clone() });
    }

    if self.executors.has(kind) {
      Ok(Dispatch::Executor)
    } else {
      Err(ControllerError::UnknownKind { kind: kind.clone() })
    }
  }

  /// Launch a task through its backend. Returns the error message on
  /// failure; the caller owns the status bookkeeping.
  async fn launch(
    &self,
    dispatch: &Dispatch,
    workflow: &Workflow,
    task: &TaskSpec,
  ) -> Result<RunResult, String> {
    match dispatch {
      Dispatch::Executor => self
        .runner
        .run(workflow, task)
        .await
        .map_err(|e| e.to_string()),

      Dispatch::Resource(connector) => {
        let name = run_name(workflow.name(), &task.name);
        let mut resource = connector
          .build_resource(workflow, task)
          .map_err(|e| e.to_string())?;

        // The controller owns identity and ownership linkage, whatever the
        // connector put in the manifest.
        resource.metadata.namespace = workflow.namespace().to_string();
        resource.metadata.name = name.clone();
        resource.metadata.owner = Some(OwnerReference {
          kind: KIND_WORKFLOW.to_string(),
          name: workflow.name().to_string(),
        });

        match self.store.create_external(&resource).await {
          Ok(()) => {}
          Err(e) if e.is_already_exists() => {}
          Err(e) => return Err(e.to_string()),
        }

        Ok(RunResult {
          task_name: task.name.clone(),
          resource_name: name,
          state: TaskState::Pending,
          message: "resource created".to_string(),
        })
      }

      Dispatch::Service(connector) => {
        let job_id = connector
          .submit(workflow, task)
          .await
          .map_err(|e| e.to_string())?;

        Ok(RunResult {
          task_name: task.name.clone(),
          resource_name: job_id,
          state: TaskState::Pending,
          message: "job submitted".to_string(),
        })
      }
    }
  }

  fn update_aggregate(&self, workflow: &mut Workflow) {
    // Failed is terminal; never overwrite it.
    if workflow.status.state == Some(TaskState::Failed) {
      return;
    }

    let all_completed = workflow.spec.tasks.iter().all(|task| {
      matches!(
        workflow.status.task(&task.name),
        Some(s) if s.state == TaskState::Completed
      )
    });

    if all_completed {
      workflow.status.state = Some(TaskState::Completed);
    }
  }

  /// Write status back, skipping the call when nothing changed this tick.
  async fn persist(
    &self,
    workflow: &Workflow,
    fetched_status: &WorkflowStatus,
  ) -> Result<(), ControllerError> {
    if &workflow.status == fetched_status {
      return Ok(());
    }
    self.store.update_status(workflow).await?;
    Ok(())
  }
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

  #[test]
  fn test_workflow_key_display() {
    let key = WorkflowKey::new("default", "etl");
    assert_eq!(key.to_string(), "default/etl");
  }

  #[test]
  fn test_reconcile_action() {
    assert!(ReconcileAction::requeue().should_requeue());
    assert!(!ReconcileAction::done().should_requeue());
  }
}
