//! Handle used by command handlers to drive the worker.
//!
//! Lifecycle actions are queued to the worker activity owned by the
//! orchestrator, which executes them one at a time and answers on a oneshot.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::worker::{Worker, WorkerError, WorkerState};

/// A lifecycle action for the worker activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerAction {
    Start,
    Stop,
    Restart,
}

impl WorkerAction {
    pub fn label(self) -> &'static str {
        match self {
            WorkerAction::Start => "start",
            WorkerAction::Stop => "stop",
            WorkerAction::Restart => "restart",
        }
    }
}

/// A queued action and where to report its outcome.
#[derive(Debug)]
pub struct WorkerRequest {
    pub action: WorkerAction,
    pub reply: oneshot::Sender<Result<(), WorkerError>>,
}

/// Cloneable control handle to the worker.
#[derive(Clone)]
pub struct WorkerHandle {
    worker: Arc<dyn Worker>,
    requests: mpsc::Sender<WorkerRequest>,
}

impl WorkerHandle {
    /// Create a handle and the receiving end for the worker activity.
    pub fn new(worker: Arc<dyn Worker>) -> (Self, mpsc::Receiver<WorkerRequest>) {
        let (requests, rx) = mpsc::channel(16);
        (Self { worker, requests }, rx)
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        self.request(WorkerAction::Start).await
    }

    pub async fn stop(&self) -> Result<(), WorkerError> {
        self.request(WorkerAction::Stop).await
    }

    pub async fn restart(&self) -> Result<(), WorkerError> {
        self.request(WorkerAction::Restart).await
    }

    pub async fn state(&self) -> Result<WorkerState, WorkerError> {
        self.worker.state().await
    }

    async fn request(&self, action: WorkerAction) -> Result<(), WorkerError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(WorkerRequest { action, reply })
            .await
            .map_err(|_| WorkerError::SupervisorGone)?;
        rx.await.map_err(|_| WorkerError::SupervisorGone)?
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle").finish_non_exhaustive()
    }
}
