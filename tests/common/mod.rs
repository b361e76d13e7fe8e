//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use farmctl::channel::{Channel, ChannelError, InboundMessage, OutboundMessage};
use farmctl::routing::CommandRouter;
use farmctl::security::{AdminSet, AuthorizationGate};
use farmctl::store::{ConfigStore, ProxyStore};
use farmctl::lifecycle::orchestrator::apply;
use farmctl::worker::{LiveProxies, Worker, WorkerError, WorkerHandle, WorkerState};

pub const ADMIN: &str = "1001";
pub const STRANGER: &str = "6666";

/// Ordered record of notable events across fixtures.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: &str) {
        self.0.lock().unwrap().push(event.to_string());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.all().iter().position(|e| e == event)
    }
}

pub fn message(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        id: "1".into(),
        sender: sender.into(),
        reply_target: format!("chat-{sender}"),
        text: text.into(),
        reply_to_text: None,
    }
}

pub fn reply_message(sender: &str, text: &str, replied: &str) -> InboundMessage {
    InboundMessage {
        reply_to_text: Some(replied.into()),
        ..message(sender, text)
    }
}

/// Worker that records calls instead of doing work.
#[derive(Default)]
pub struct RecordingWorker {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    running: AtomicBool,
    pub fail_start: AtomicBool,
    pub panic_on_start: AtomicBool,
    pub events: Events,
}

impl RecordingWorker {
    pub fn with_events(events: Events) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst) + self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for RecordingWorker {
    async fn start(&self) -> Result<(), WorkerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.events.push("worker:start");
        if self.panic_on_start.load(Ordering::SeqCst) {
            panic!("worker exploded");
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(WorkerError::Other("no devices".into()));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), WorkerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.events.push("worker:stop");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn state(&self) -> Result<WorkerState, WorkerError> {
        Ok(if self.running.load(Ordering::SeqCst) {
            WorkerState::Running
        } else {
            WorkerState::Idle
        })
    }
}

struct ListenGuard(Events);

impl Drop for ListenGuard {
    fn drop(&mut self) {
        self.0.push("channel:stopped");
    }
}

/// In-memory transport. Tests push inbound messages and read replies.
pub struct MemoryChannel {
    inbox: tokio::sync::Mutex<Option<mpsc::Receiver<InboundMessage>>>,
    sent: Mutex<Vec<OutboundMessage>>,
    notify: Notify,
    pub events: Events,
}

impl MemoryChannel {
    pub fn new(events: Events) -> (Arc<Self>, mpsc::Sender<InboundMessage>) {
        let (tx, rx) = mpsc::channel(16);
        let channel = Arc::new(Self {
            inbox: tokio::sync::Mutex::new(Some(rx)),
            sent: Mutex::new(Vec::new()),
            notify: Notify::new(),
            events,
        });
        (channel, tx)
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` replies were sent.
    pub async fn wait_for_replies(&self, count: usize) -> Vec<OutboundMessage> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.notify.notified();
                let sent = self.sent();
                if sent.len() >= count {
                    return sent;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for replies")
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(message.clone());
        self.notify.notify_waiters();
        Ok(())
    }

    async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> Result<(), ChannelError> {
        let _guard = ListenGuard(self.events.clone());
        let inbox = self.inbox.lock().await.take();
        if let Some(mut inbox) = inbox {
            while let Some(msg) = inbox.recv().await {
                if tx.send(msg).await.is_err() {
                    return Ok(());
                }
            }
        }
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Router wired to temp-dir stores and a recording worker.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub router: CommandRouter,
    pub worker: Arc<RecordingWorker>,
    pub live: LiveProxies,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(RecordingWorker::default());
        let live = LiveProxies::default();

        let config = Arc::new(ConfigStore::new(dir.path().join("config.json")));
        let proxies = Arc::new(ProxyStore::new(dir.path().join("proxy.txt")).with_live(live.clone()));

        let (handle, mut requests) = WorkerHandle::new(worker.clone());
        let served: Arc<dyn Worker> = worker.clone();
        tokio::spawn(async move {
            while let Some(req) = requests.recv().await {
                let outcome = apply(served.clone(), req.action).await;
                let _ = req.reply.send(outcome);
            }
        });

        let router = CommandRouter::new(
            AuthorizationGate::new(AdminSet::new([ADMIN])),
            config,
            proxies,
            handle,
        );

        Self {
            dir,
            router,
            worker,
            live,
        }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.dir.path().join("config.json")
    }

    pub fn proxy_path(&self) -> std::path::PathBuf {
        self.dir.path().join("proxy.txt")
    }

    pub fn read_config(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.config_path()).unwrap_or_else(|_| "{}".into());
        serde_json::from_str(&content).unwrap()
    }

    pub fn read_proxies(&self) -> Vec<String> {
        std::fs::read_to_string(self.proxy_path())
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    /// Dispatch and return the reply text, if any.
    pub async fn send(&self, msg: InboundMessage) -> Option<String> {
        self.router.dispatch(&msg).await.map(|r| r.text)
    }
}
