//! Worker control surface.
//!
//! The farming logic itself lives outside this crate. The control bot only
//! needs to start it, stop it, ask what it is doing, and share the live proxy
//! list with it.
//!
//! # Design Decisions
//! - `start` and `stop` return once the transition is requested; the work
//!   itself runs in the background
//! - Both are idempotent: starting a running worker is not an error
//! - Only the proxy store publishes to `LiveProxies`; the worker activity
//!   restarts a running worker when it changes

pub mod handle;
pub mod live;
pub mod process;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use handle::{WorkerAction, WorkerHandle, WorkerRequest};
pub use live::LiveProxies;
pub use process::ProcessWorker;

/// Observable worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Never started, or stopped by an operator.
    Idle,
    /// Farming.
    Running,
    /// Exited on its own.
    Exited,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerState::Idle => "Idle",
            WorkerState::Running => "Active",
            WorkerState::Exited => "Exited",
        };
        f.write_str(label)
    }
}

/// Errors controlling the worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker is not configured")]
    NotConfigured,

    #[error("failed to launch worker: {0}")]
    Launch(#[source] std::io::Error),

    #[error("failed to stop worker: {0}")]
    Stop(#[source] std::io::Error),

    #[error("worker supervisor is not running")]
    SupervisorGone,

    #[error("{0}")]
    Other(String),
}

/// The external automation process.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Begin farming.
    async fn start(&self) -> Result<(), WorkerError>;

    /// Stop farming.
    async fn stop(&self) -> Result<(), WorkerError>;

    /// Current state.
    async fn state(&self) -> Result<WorkerState, WorkerError>;
}
