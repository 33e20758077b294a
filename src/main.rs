use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use capstan_api::{validate_workflow, RunPhase, TaskState, Workflow};
use capstan_connector::ConnectorRegistry;
use capstan_controller::{Controller, ControllerConfig, WorkflowController, WorkflowKey};
use capstan_executor::{ContainerExecutor, Registry};
use capstan_runner::DefaultRunner;
use capstan_scheduler::{DefaultScheduler, SchedulerConfig};
use capstan_store::{MemoryStore, Store};

/// Capstan - declarative workflow orchestration for container platforms
#[derive(Parser)]
#[command(name = "capstan")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow manifest to completion against an in-process store
  Run {
    /// Path to the workflow manifest (JSON)
    #[arg(long)]
    workflow: PathBuf,

    /// Per-workflow cap on tasks in Pending or Running at once
    #[arg(long, default_value_t = 10)]
    max_active_tasks: usize,
  },

  /// Validate a workflow manifest without running it
  Validate {
    /// Path to the workflow manifest (JSON)
    #[arg(long)]
    workflow: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Run {
      workflow,
      max_active_tasks,
    } => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_workflow(workflow, max_active_tasks))
    }
    Commands::Validate { workflow } => validate_manifest(workflow),
  }
}

fn load_manifest(path: &PathBuf) -> Result<Workflow> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;
  let workflow: Workflow = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))?;
  Ok(workflow)
}

fn validate_manifest(path: PathBuf) -> Result<()> {
  let workflow = load_manifest(&path)?;
  validate_workflow(&workflow.spec)
    .with_context(|| format!("workflow '{}' is invalid", workflow.name()))?;

  eprintln!(
    "workflow '{}' is valid ({} tasks)",
    workflow.name(),
    workflow.spec.tasks.len()
  );
  Ok(())
}

async fn run_workflow(path: PathBuf, max_active_tasks: usize) -> Result<()> {
  let mut workflow = load_manifest(&path)?;
  validate_workflow(&workflow.spec)
    .with_context(|| format!("workflow '{}' is invalid", workflow.name()))?;

  if workflow.namespace().is_empty() {
    workflow.metadata.namespace = "default".to_string();
  }
  let key = WorkflowKey::new(workflow.namespace(), workflow.name());

  eprintln!(
    "loaded workflow '{}' with {} tasks",
    workflow.name(),
    workflow.spec.tasks.len()
  );

  // Wire the controller exactly as a deployment would, but over the
  // in-process store and a simulated container runtime.
  let store = Arc::new(MemoryStore::new());
  store.create_workflow(&workflow).await?;

  let executors = Arc::new(Registry::new());
  executors.register(Arc::new(ContainerExecutor::new(
    store.clone() as Arc<dyn Store>
  )));
  let connectors = Arc::new(ConnectorRegistry::new());
  let scheduler = Arc::new(DefaultScheduler::new(SchedulerConfig {
    max_active_tasks,
    ..SchedulerConfig::default()
  }));
  let runner = Arc::new(DefaultRunner::with_defaults(executors.clone()));

  let inner = Arc::new(WorkflowController::new(
    store.clone(),
    executors,
    connectors,
    scheduler,
    runner,
  ));
  let controller = Controller::new(inner, ControllerConfig::default());
  let handle = controller.handle();

  let cancel = CancellationToken::new();
  let loop_task = tokio::spawn(controller.run(cancel.clone()));
  spawn_runtime_sim(store.clone(), key.namespace.clone(), cancel.clone());

  handle.enqueue(key.clone());

  // Wait until the controller parks the workflow in a terminal state.
  let finished = loop {
    let current = store.get_workflow(&key.namespace, &key.name).await?;
    if current.status.is_terminal() {
      break current;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  };

  cancel.cancel();
  let _ = loop_task.await;

  println!("{}", serde_json::to_string_pretty(&finished.status)?);

  match finished.status.state {
    Some(TaskState::Completed) => Ok(()),
    _ => bail!("workflow '{}' failed", finished.name()),
  }
}

/// Plays the container runtime for demo runs: every run steps
/// Pending -> Running -> Succeeded, except commands that clearly exit
/// non-zero, which step to Failed.
fn spawn_runtime_sim(store: Arc<MemoryStore>, namespace: String, cancel: CancellationToken) {
  tokio::spawn(async move {
    loop {
      if cancel.is_cancelled() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;

      let runs = store.list_runs(&namespace).await.unwrap_or_default();
      for mut run in runs {
        let next = match run.status.phase {
          RunPhase::Pending => Some(RunPhase::Running),
          RunPhase::Running => {
            if simulates_failure(&run.spec.args) {
              Some(RunPhase::Failed)
            } else {
              Some(RunPhase::Succeeded)
            }
          }
          _ => None,
        };
        if let Some(phase) = next {
          run.status.phase = phase;
          let _ = store.update_run(&run).await;
        }
      }
    }
  });
}

fn simulates_failure(args: &[String]) -> bool {
  args
    .iter()
    .any(|a| a.trim() == "false" || a.contains("exit 1"))
}
