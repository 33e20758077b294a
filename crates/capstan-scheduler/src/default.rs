use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use capstan_api::{TaskSpec, TaskState, Workflow};

use crate::config::{Policy, SchedulerConfig, TaskInfo};
use crate::scheduler::Scheduler;

/// The stock scheduler: FIFO over spec order, bounded by
/// [`SchedulerConfig::max_active_tasks`].
pub struct DefaultScheduler {
  config: SchedulerConfig,
  counters: Mutex<Counters>,
}

/// Active-task accounting for future cross-workflow policies. Never consulted
/// for the per-workflow admission decision.
#[derive(Default)]
struct Counters {
  active_per_workflow: HashMap<String, usize>,
  total_active: usize,
}

impl DefaultScheduler {
  pub fn new(config: SchedulerConfig) -> Self {
    Self {
      config,
      counters: Mutex::new(Counters::default()),
    }
  }

  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  /// Total tasks currently accounted as active, across all workflows.
  pub fn active_task_count(&self) -> usize {
    self.lock().total_active
  }

  /// Tasks currently accounted as active for one workflow.
  pub fn active_tasks_for(&self, workflow: &str) -> usize {
    self
      .lock()
      .active_per_workflow
      .get(workflow)
      .copied()
      .unwrap_or(0)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
    self.counters.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn sort_by_policy(&self, _candidates: &mut [TaskSpec]) {
    match self.config.policy {
      // Candidates already carry spec order.
      Policy::Fifo => {}
      // TODO: order by TaskSpec priority once the field exists.
      Policy::Priority => {}
      // TODO: weigh candidates by per-workflow share once cross-workflow
      // scheduling lands.
      Policy::FairShare => {}
    }
  }
}

impl Default for DefaultScheduler {
  fn default() -> Self {
    Self::new(SchedulerConfig::default())
  }
}

impl Scheduler for DefaultScheduler {
  fn name(&self) -> &str {
    "default-scheduler"
  }

  fn policy(&self) -> Policy {
    self.config.policy
  }

  fn schedule(&self, workflow: &Workflow) -> Vec<TaskSpec> {
    let status = &workflow.status;

    // Candidates: never admitted, all dependencies Completed, spec order.
    let mut candidates: Vec<TaskSpec> = workflow
      .spec
      .tasks
      .iter()
      .filter(|task| status.task(&task.name).is_none())
      .filter(|task| {
        task
          .dependencies
          .iter()
          .all(|dep| matches!(status.task(dep), Some(s) if s.state == TaskState::Completed))
      })
      .cloned()
      .collect();

    self.sort_by_policy(&mut candidates);

    let active = status.active_count();
    let slots = self.config.max_active_tasks.saturating_sub(active);
    if slots == 0 {
      return Vec::new();
    }
    candidates.truncate(slots);

    debug!(
      workflow = %workflow.name(),
      candidates = candidates.len(),
      active,
      "scheduled tick"
    );
    candidates
  }

  fn can_schedule(&self, _task: &TaskInfo) -> bool {
    self.lock().total_active < self.config.max_active_tasks
  }

  fn notify_task_started(&self, workflow: &str, _task: &str) {
    let mut counters = self.lock();
    *counters
      .active_per_workflow
      .entry(workflow.to_string())
      .or_insert(0) += 1;
    counters.total_active += 1;
  }

  fn notify_task_completed(&self, workflow: &str, _task: &str) {
    let mut counters = self.lock();
    if let Some(active) = counters.active_per_workflow.get_mut(workflow) {
      *active = active.saturating_sub(1);
      if *active == 0 {
        counters.active_per_workflow.remove(workflow);
      }
    }
    counters.total_active = counters.total_active.saturating_sub(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use capstan_api::{TaskKind, TaskStatus, WorkflowSpec};

  fn task(name: &str, deps: &[&str]) -> TaskSpec {
    TaskSpec {
      name: name.to_string(),
      kind: TaskKind::shell(),
      dependencies: deps.iter().map(|d| d.to_string()).collect(),
      command: Some("true".to_string()),
      ..TaskSpec::default()
    }
  }

  fn workflow(tasks: Vec<TaskSpec>) -> Workflow {
    Workflow::new("default", "wf", WorkflowSpec { tasks })
  }

  fn record(workflow: &mut Workflow, name: &str, state: TaskState) {
    workflow.status.task_statuses.push(TaskStatus {
      name: name.to_string(),
      state,
      resource_name: String::new(),
      message: String::new(),
    });
  }

  #[test]
  fn test_root_tasks_are_admissible_immediately() {
    let scheduler = DefaultScheduler::default();
    let wf = workflow(vec![task("a", &[]), task("b", &["a"])]);

    let admitted = scheduler.schedule(&wf);
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].name, "a");
  }

  #[test]
  fn test_task_waits_for_all_dependencies() {
    let scheduler = DefaultScheduler::default();
    let mut wf = workflow(vec![task("a", &[]), task("b", &[]), task("c", &["a", "b"])]);
    record(&mut wf, "a", TaskState::Completed);
    record(&mut wf, "b", TaskState::Running);

    // b is not Completed yet, so c stays out.
    assert!(scheduler.schedule(&wf).is_empty());

    wf.status.task_mut("b").unwrap().state = TaskState::Completed;
    let admitted = scheduler.schedule(&wf);
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].name, "c");
  }

  #[test]
  fn test_unknown_dependency_leaves_task_unready() {
    // Spec validation happens upstream; the scheduler just never sees the
    // dependency complete.
    let scheduler = DefaultScheduler::default();
    let wf = workflow(vec![task("a", &["ghost"])]);

    assert!(scheduler.schedule(&wf).is_empty());
  }

  #[test]
  fn test_admitted_tasks_are_not_rescheduled() {
    let scheduler = DefaultScheduler::default();
    let mut wf = workflow(vec![task("a", &[])]);
    record(&mut wf, "a", TaskState::Pending);

    assert!(scheduler.schedule(&wf).is_empty());
  }

  #[test]
  fn test_candidates_keep_spec_order() {
    let scheduler = DefaultScheduler::default();
    let wf = workflow(vec![task("c", &[]), task("a", &[]), task("b", &[])]);

    let admitted = scheduler.schedule(&wf);
    let names: Vec<&str> = admitted.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
  }

  #[test]
  fn test_concurrency_limit_bounds_admission() {
    let scheduler = DefaultScheduler::new(SchedulerConfig {
      max_active_tasks: 2,
      ..SchedulerConfig::default()
    });
    let wf = workflow(vec![
      task("a", &[]),
      task("b", &[]),
      task("c", &[]),
      task("d", &[]),
      task("e", &[]),
    ]);

    let admitted = scheduler.schedule(&wf);
    let names: Vec<&str> = admitted.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
  }

  #[test]
  fn test_no_slots_when_active_tasks_fill_limit() {
    let scheduler = DefaultScheduler::new(SchedulerConfig {
      max_active_tasks: 2,
      ..SchedulerConfig::default()
    });
    let mut wf = workflow(vec![task("a", &[]), task("b", &[]), task("c", &[])]);
    record(&mut wf, "a", TaskState::Pending);
    record(&mut wf, "b", TaskState::Running);

    assert!(scheduler.schedule(&wf).is_empty());

    // A completed task frees exactly one slot.
    wf.status.task_mut("a").unwrap().state = TaskState::Completed;
    let admitted = scheduler.schedule(&wf);
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].name, "c");
  }

  #[test]
  fn test_reserved_policies_behave_as_fifo() {
    for policy in [Policy::Priority, Policy::FairShare] {
      let scheduler = DefaultScheduler::new(SchedulerConfig {
        policy,
        ..SchedulerConfig::default()
      });
      let wf = workflow(vec![task("z", &[]), task("a", &[])]);

      let admitted = scheduler.schedule(&wf);
      let names: Vec<&str> = admitted.iter().map(|t| t.name.as_str()).collect();
      assert_eq!(names, vec!["z", "a"], "policy {:?}", policy);
    }
  }

  #[test]
  fn test_counters_track_start_and_completion() {
    let scheduler = DefaultScheduler::default();

    scheduler.notify_task_started("wf", "a");
    scheduler.notify_task_started("wf", "b");
    scheduler.notify_task_started("other", "a");
    assert_eq!(scheduler.active_task_count(), 3);
    assert_eq!(scheduler.active_tasks_for("wf"), 2);

    scheduler.notify_task_completed("wf", "a");
    scheduler.notify_task_completed("wf", "b");
    assert_eq!(scheduler.active_task_count(), 1);
    // The per-workflow entry is pruned at zero.
    assert_eq!(scheduler.active_tasks_for("wf"), 0);
  }

  #[test]
  fn test_counters_never_go_negative() {
    let scheduler = DefaultScheduler::default();

    scheduler.notify_task_completed("wf", "ghost");
    assert_eq!(scheduler.active_task_count(), 0);
    assert_eq!(scheduler.active_tasks_for("wf"), 0);
  }

  #[test]
  fn test_can_schedule_is_a_total_capacity_query() {
    let scheduler = DefaultScheduler::new(SchedulerConfig {
      max_active_tasks: 1,
      ..SchedulerConfig::default()
    });
    let info = TaskInfo {
      workflow: "wf".to_string(),
      task: "a".to_string(),
      priority: 0,
    };

    assert!(scheduler.can_schedule(&info));
    scheduler.notify_task_started("wf", "a");
    assert!(!scheduler.can_schedule(&info));
    scheduler.notify_task_completed("wf", "a");
    assert!(scheduler.can_schedule(&info));
  }
}
