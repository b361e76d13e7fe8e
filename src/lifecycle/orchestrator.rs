//! Supervision of the channel and worker activities.
//!
//! # Responsibilities
//! - Launch the channel activity, then the worker activity (startup delay)
//! - Observe both; a failure in one never stops the other
//! - Restart a running worker when the live proxy list changes
//! - Ordered shutdown: channel first, then worker
//!
//! # Design Decisions
//! - Each activity has its own `Shutdown` so the order is explicit
//! - Inbound messages are handled on their own tasks, joined on shutdown
//! - Worker actions run on a throwaway task so a panicking worker is reported
//!   as an error instead of killing the activity
//! - The worker program reads the proxy file at launch, so a new list reaches
//!   it through a restart
//! - No shutdown timeout: a worker that never stops hangs shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::channel::{Channel, InboundMessage};
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::observability::metrics;
use crate::routing::{CommandKind, CommandRouter};
use crate::worker::{LiveProxies, Worker, WorkerAction, WorkerError, WorkerRequest, WorkerState};

const MAX_BACKOFF_SECS: u64 = 60;

/// Owns both long-running activities for the process lifetime.
pub struct Orchestrator {
    channel: Arc<dyn Channel>,
    router: Arc<CommandRouter>,
    worker: Arc<dyn Worker>,
    requests: mpsc::Receiver<WorkerRequest>,
    proxies: LiveProxies,
    startup_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        channel: Arc<dyn Channel>,
        router: Arc<CommandRouter>,
        worker: Arc<dyn Worker>,
        requests: mpsc::Receiver<WorkerRequest>,
        proxies: LiveProxies,
        startup_delay: Duration,
    ) -> Self {
        Self {
            channel,
            router,
            worker,
            requests,
            proxies,
            startup_delay,
        }
    }

    /// Run until `stop` resolves, then shut down in order.
    pub async fn run<F>(self, stop: F)
    where
        F: Future<Output = ()>,
    {
        let channel_shutdown = Shutdown::new();
        let worker_shutdown = Shutdown::new();

        let mut channel_task = tokio::spawn(run_channel(
            self.channel.clone(),
            self.router.clone(),
            channel_shutdown.signal(),
        ));
        tracing::info!(channel = self.channel.name(), "Channel activity started");

        let mut worker_task = tokio::spawn(run_worker(
            self.worker.clone(),
            self.requests,
            self.proxies,
            self.startup_delay,
            worker_shutdown.signal(),
        ));
        tracing::info!(delay = ?self.startup_delay, "Worker activity started");

        let mut channel_done = false;
        let mut worker_done = false;
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                joined = &mut channel_task, if !channel_done => {
                    channel_done = true;
                    report("channel", joined);
                }
                joined = &mut worker_task, if !worker_done => {
                    worker_done = true;
                    report("worker", joined);
                }
            }
        }

        tracing::info!("Stopping channel activity");
        channel_shutdown.trigger();
        if !channel_done {
            report("channel", channel_task.await);
        }

        tracing::info!("Stopping worker activity");
        worker_shutdown.trigger();
        if !worker_done {
            report("worker", worker_task.await);
        }

        tracing::info!("Shutdown complete");
    }
}

fn report(activity: &str, joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => tracing::info!(activity, "Activity finished"),
        Err(e) if e.is_panic() => tracing::error!(activity, error = %e, "Activity panicked"),
        Err(e) => tracing::warn!(activity, error = %e, "Activity cancelled"),
    }
}

/// Channel activity: listen, dispatch each message on its own task, and
/// restart the listener with backoff if it ends.
async fn run_channel(
    channel: Arc<dyn Channel>,
    router: Arc<CommandRouter>,
    mut shutdown: ShutdownSignal,
) {
    if let Err(e) = channel.register_commands(&CommandKind::menu()).await {
        tracing::warn!(error = %e, "Failed to register command menu");
    }

    let mut handlers = JoinSet::new();
    let mut backoff_secs: u64 = 1;

    loop {
        let (tx, mut rx) = mpsc::channel::<InboundMessage>(64);
        let listener = channel.clone();
        let mut listen: JoinHandle<_> = tokio::spawn(async move { listener.listen(tx).await });

        let stopping = loop {
            tokio::select! {
                _ = shutdown.wait() => break true,
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        backoff_secs = 1;
                        spawn_handler(&mut handlers, channel.clone(), router.clone(), msg);
                    }
                    None => break false,
                },
                Some(joined) = handlers.join_next() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Command handler panicked");
                    }
                }
            }
        };

        if stopping {
            listen.abort();
            let _ = (&mut listen).await;
            break;
        }

        match listen.await {
            Ok(Ok(())) => tracing::warn!(channel = channel.name(), "Listener ended"),
            Ok(Err(e)) => tracing::error!(channel = channel.name(), error = %e, "Listener failed"),
            Err(e) => tracing::error!(channel = channel.name(), error = %e, "Listener panicked"),
        }

        tracing::warn!(delay_secs = backoff_secs, "Restarting listener");
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
        }
        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
    }

    while let Some(joined) = handlers.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Command handler panicked");
        }
    }
    tracing::info!(channel = channel.name(), "Channel activity stopped");
}

fn spawn_handler(
    handlers: &mut JoinSet<()>,
    channel: Arc<dyn Channel>,
    router: Arc<CommandRouter>,
    msg: InboundMessage,
) {
    handlers.spawn(async move {
        let Some(reply) = router.dispatch(&msg).await else {
            return;
        };
        if let Err(e) = channel.send(&reply.to(&msg.reply_target)).await {
            tracing::warn!(message_id = %msg.id, error = %e, "Failed to deliver reply");
        }
    });
}

/// Worker activity: start after the delay, serve lifecycle requests, follow
/// proxy list changes, stop on shutdown.
async fn run_worker(
    worker: Arc<dyn Worker>,
    mut requests: mpsc::Receiver<WorkerRequest>,
    proxies: LiveProxies,
    startup_delay: Duration,
    mut shutdown: ShutdownSignal,
) {
    let startup = tokio::time::sleep(startup_delay);
    tokio::pin!(startup);
    let mut auto_start = true;
    let mut requests_open = true;
    let mut updates = proxies.subscribe();
    let mut watching = true;

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = &mut startup, if auto_start => {
                auto_start = false;
                if let Err(e) = apply(worker.clone(), WorkerAction::Start).await {
                    tracing::error!(error = %e, "Worker failed to start");
                }
            }
            req = requests.recv(), if requests_open => match req {
                Some(WorkerRequest { action, reply }) => {
                    // An operator took control; skip the pending auto start.
                    auto_start = false;
                    let outcome = apply(worker.clone(), action).await;
                    let _ = reply.send(outcome);
                }
                None => requests_open = false,
            },
            changed = updates.changed(), if watching => match changed {
                Ok(()) => follow_proxy_change(&worker, &proxies).await,
                Err(_) => watching = false,
            },
        }
    }

    if let Err(e) = apply(worker, WorkerAction::Stop).await {
        tracing::warn!(error = %e, "Worker did not stop cleanly");
    }
    tracing::info!("Worker activity stopped");
}

/// Restart the worker if it is farming, so it picks up the new list.
async fn follow_proxy_change(worker: &Arc<dyn Worker>, proxies: &LiveProxies) {
    let count = proxies.len();
    match worker.state().await {
        Ok(WorkerState::Running) => {
            tracing::info!(proxies = count, "Proxy list changed, restarting worker");
            if let Err(e) = apply(worker.clone(), WorkerAction::Restart).await {
                tracing::error!(error = %e, "Worker failed to restart with new proxies");
            }
        }
        Ok(state) => {
            tracing::debug!(proxies = count, state = %state, "Proxy list changed, worker not running");
        }
        Err(e) => tracing::warn!(error = %e, "Could not query worker after proxy change"),
    }
}

/// Execute one lifecycle action. A panicking worker is reported as
/// `WorkerError::Other` and leaves the caller running.
pub async fn apply(worker: Arc<dyn Worker>, action: WorkerAction) -> Result<(), WorkerError> {
    let outcome = tokio::spawn(async move {
        match action {
            WorkerAction::Start => worker.start().await,
            WorkerAction::Stop => worker.stop().await,
            WorkerAction::Restart => {
                worker.stop().await?;
                worker.start().await
            }
        }
    })
    .await
    .unwrap_or_else(|e| Err(WorkerError::Other(format!("worker {} panicked: {e}", action.label()))));

    metrics::record_worker_transition(action.label(), outcome.is_ok());
    match &outcome {
        Ok(()) => tracing::info!(action = action.label(), "Worker action applied"),
        Err(e) => tracing::warn!(action = action.label(), error = %e, "Worker action failed"),
    }
    outcome
}
