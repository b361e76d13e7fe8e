//! Worker backed by an external program.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::worker::{Worker, WorkerError, WorkerState};

/// Environment variable telling the child where the configuration lives.
pub const CONFIG_PATH_ENV: &str = "FARMCTL_CONFIG_PATH";

/// Environment variable telling the child where the proxy list lives.
pub const PROXY_PATH_ENV: &str = "FARMCTL_PROXY_PATH";

/// Runs the farming program as a child process.
///
/// The child reads the configuration and proxy files itself, so it picks up
/// operator changes on its next restart.
pub struct ProcessWorker {
    program: Option<String>,
    args: Vec<String>,
    config_path: PathBuf,
    proxy_path: PathBuf,
    child: Mutex<Option<Child>>,
}

impl ProcessWorker {
    pub fn new(
        program: Option<String>,
        args: Vec<String>,
        config_path: PathBuf,
        proxy_path: PathBuf,
    ) -> Self {
        Self {
            program,
            args,
            config_path,
            proxy_path,
            child: Mutex::new(None),
        }
    }

    fn command(&self) -> Result<Command, WorkerError> {
        let program = self.program.as_deref().ok_or(WorkerError::NotConfigured)?;
        let mut cmd = Command::new(program);
        cmd.args(&self.args)
            .env(CONFIG_PATH_ENV, &self.config_path)
            .env(PROXY_PATH_ENV, &self.proxy_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        Ok(cmd)
    }
}

#[async_trait]
impl Worker for ProcessWorker {
    async fn start(&self) -> Result<(), WorkerError> {
        let mut slot = self.child.lock().await;
        if let Some(child) = slot.as_mut() {
            match child.try_wait() {
                Ok(None) => {
                    tracing::debug!("Worker already running");
                    return Ok(());
                }
                Ok(Some(status)) => {
                    tracing::info!(status = %status, "Previous worker process exited, relaunching");
                }
                Err(e) => tracing::warn!(error = %e, "Failed to poll previous worker process"),
            }
        }

        let child = self.command()?.spawn().map_err(WorkerError::Launch)?;
        tracing::info!(pid = ?child.id(), "Worker process launched");
        *slot = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), WorkerError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        child.kill().await.map_err(WorkerError::Stop)?;
        tracing::info!("Worker process stopped");
        Ok(())
    }

    async fn state(&self) -> Result<WorkerState, WorkerError> {
        let mut slot = self.child.lock().await;
        let Some(child) = slot.as_mut() else {
            return Ok(WorkerState::Idle);
        };
        match child.try_wait() {
            Ok(None) => Ok(WorkerState::Running),
            Ok(Some(_)) => Ok(WorkerState::Exited),
            Err(e) => Err(WorkerError::Other(format!("failed to poll worker: {e}"))),
        }
    }
}
