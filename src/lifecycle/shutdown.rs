//! Stop signal for one supervised activity.
//!
//! The orchestrator owns one `Shutdown` per activity and triggers them in
//! order. The signal is level-triggered: an activity that starts waiting after
//! the trigger still sees it, and every wait after that returns at once.

use tokio::sync::watch;

/// Trigger side, held by the orchestrator.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Waiting side, handed to the activity.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask the activity to stop. Repeated triggers are harmless.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once the activity has been asked to stop.
    pub async fn wait(&mut self) {
        // Err means the orchestrator is gone; treat it as a stop request too.
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_before_wait_is_observed() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        assert!(!signal.is_triggered());

        shutdown.trigger();
        signal.wait().await;
        // level-triggered: waiting again does not block
        signal.wait().await;
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_each_activity_stops_independently() {
        let channel = Shutdown::new();
        let worker = Shutdown::new();
        let mut channel_signal = channel.signal();
        let mut worker_signal = worker.signal();

        channel.trigger();
        channel_signal.wait().await;

        let pending = tokio::time::timeout(Duration::from_millis(20), worker_signal.wait()).await;
        assert!(pending.is_err());

        worker.trigger();
        worker_signal.wait().await;
    }

    #[tokio::test]
    async fn test_dropped_trigger_releases_waiters() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        drop(shutdown);
        signal.wait().await;
    }
}
