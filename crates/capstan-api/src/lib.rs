//! Resource model for the `workflow/v1` API.
//!
//! A [`Workflow`] is the user-facing resource: a spec holding an ordered list
//! of task definitions and a controller-owned status. [`ContainerRun`] is the
//! execution resource the built-in executor materialises for each task, and
//! [`ExternalResource`] is the opaque manifest shape used by external-resource
//! connectors.

mod external;
mod kind;
mod meta;
mod run;
mod state;
mod task;
mod validate;
mod workflow;

pub use external::ExternalResource;
pub use kind::TaskKind;
pub use meta::{ObjectMeta, OwnerReference};
pub use run::{
  run_name, ContainerRun, ContainerRunSpec, ContainerRunStatus, EnvVar, RestartPolicy, RunPhase,
  APP_NAME, ENV_TASK_KIND, ENV_TASK_NAME, LABEL_APP_NAME, LABEL_APP_PART_OF, LABEL_TASK,
  LABEL_WORKFLOW,
};
pub use state::TaskState;
pub use task::{TaskSpec, TaskStatus};
pub use validate::{validate_workflow, ValidationError};
pub use workflow::{Workflow, WorkflowSpec, WorkflowStatus, API_VERSION, KIND_WORKFLOW};
