//! A minimal work-queue loop around [`WorkflowController`].
//!
//! Stands in for the host controller framework: keys are enqueued by
//! whoever watches the store (or by the resources' own status transitions),
//! reconciliations run one at a time so any single workflow is never
//! reconciled concurrently, and failed or still-running ticks are requeued
//! after a fixed delay. Real deployments get rate-limited backoff and leader
//! election from the framework; this loop only needs to be correct.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::{WorkflowController, WorkflowKey};
use crate::error::ControllerError;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
  /// Delay before a requeued key is reconciled again.
  pub requeue_delay: Duration,
}

impl Default for ControllerConfig {
  fn default() -> Self {
    Self {
      requeue_delay: Duration::from_millis(50),
    }
  }
}

/// Enqueues workflow keys for reconciliation. Cheap to clone.
#[derive(Clone)]
pub struct ControllerHandle {
  tx: mpsc::UnboundedSender<WorkflowKey>,
}

impl ControllerHandle {
  /// Queue a workflow for reconciliation. Dropped silently if the loop has
  /// stopped.
  pub fn enqueue(&self, key: WorkflowKey) {
    let _ = self.tx.send(key);
  }
}

/// The reconcile loop: drains the queue until cancelled.
pub struct Controller {
  inner: Arc<WorkflowController>,
  config: ControllerConfig,
  tx: mpsc::UnboundedSender<WorkflowKey>,
  rx: mpsc::UnboundedReceiver<WorkflowKey>,
}

impl Controller {
  pub fn new(inner: Arc<WorkflowController>, config: ControllerConfig) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      inner,
      config,
      tx,
      rx,
    }
  }

  pub fn handle(&self) -> ControllerHandle {
    ControllerHandle {
      tx: self.tx.clone(),
    }
  }

  /// Process keys until the token is cancelled or every sender is gone.
  pub async fn run(mut self, cancel: CancellationToken) {
    info!("controller started");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("controller stopping");
          break;
        }
        key = self.rx.recv() => {
          let Some(key) = key else { break };

          match self.inner.reconcile(&cancel, &key).await {
            Ok(action) if action.should_requeue() => self.requeue(key),
            Ok(_) => {}
            Err(ControllerError::Canceled) => {
              info!("controller stopping");
              break;
            }
            Err(e) => {
              warn!(workflow = %key, error = %e, "reconciliation failed, requeueing");
              self.requeue(key);
            }
          }
        }
      }
    }
  }

  fn requeue(&self, key: WorkflowKey) {
    let tx = self.tx.clone();
    let delay = self.config.requeue_delay;
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = tx.send(key);
    });
  }
}
