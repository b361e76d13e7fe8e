//! Live proxy view shared between the proxy store and the worker.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::watch;

/// Current proxy list as seen by the worker.
///
/// The proxy store publishes whole lists; the worker activity reads them and
/// is woken on every publish. Cloning yields another handle to the same list.
#[derive(Debug, Clone)]
pub struct LiveProxies {
    inner: Arc<ArcSwap<Vec<String>>>,
    /// Publish counter, bumped after each swap.
    version: Arc<watch::Sender<u64>>,
}

impl LiveProxies {
    pub fn new(initial: Vec<String>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
            version: Arc::new(version),
        }
    }

    /// Replace the whole list and wake subscribers.
    pub fn publish(&self, proxies: Vec<String>) {
        self.inner.store(Arc::new(proxies));
        self.version.send_modify(|v| *v += 1);
    }

    /// Snapshot of the current list.
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.inner.load_full()
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Receiver that changes on every later publish. Publishes made before
    /// subscribing are already seen.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl Default for LiveProxies {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_is_visible_to_clones() {
        let live = LiveProxies::default();
        let reader = live.clone();
        live.publish(vec!["http://x:1".into(), "http://y:2".into()]);
        assert_eq!(reader.snapshot().as_slice(), ["http://x:1", "http://y:2"]);
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_old_snapshot_is_stable() {
        let live = LiveProxies::new(vec!["http://a:1".into()]);
        let before = live.snapshot();
        live.publish(Vec::new());
        assert_eq!(before.len(), 1);
        assert!(live.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_wake_on_publish_only() {
        let live = LiveProxies::default();
        live.publish(vec!["http://early:1".into()]);

        let mut updates = live.subscribe();
        assert!(!updates.has_changed().unwrap());

        live.clone().publish(vec!["http://a:1".into()]);
        updates.changed().await.unwrap();
        assert_eq!(live.snapshot().as_slice(), ["http://a:1"]);
    }
}
