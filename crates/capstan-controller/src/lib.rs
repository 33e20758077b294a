//! The reconciler: a level-triggered control loop over workflow resources.
//!
//! Every tick recomputes the workflow's desired next step from observed
//! state — never from in-memory assumptions — so a restarted controller
//! resumes exactly where the persisted status says it was. The
//! [`WorkflowController`] implements one tick; the [`Controller`] work queue
//! drives ticks and stands in for the host controller framework's per-key
//! serialisation and requeue machinery.

mod controller;
mod error;
mod queue;

pub use controller::{ReconcileAction, WorkflowController, WorkflowKey};
pub use error::ControllerError;
pub use queue::{Controller, ControllerConfig, ControllerHandle};
