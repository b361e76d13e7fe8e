//! Proxy list file.
//!
//! # Responsibilities
//! - Load the list, one URI per line
//! - Replace the list verbatim (no de-duplication, no reordering)
//! - Publish each replacement to the worker's live view

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::observability::metrics;
use crate::store::atomic::atomic_write_file;
use crate::store::StorageError;
use crate::worker::LiveProxies;

/// File-backed proxy list store.
#[derive(Debug)]
pub struct ProxyStore {
    path: PathBuf,
    live: Option<LiveProxies>,
    /// Held across write-then-publish so file and live view agree.
    write_lock: Mutex<()>,
}

impl ProxyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            live: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Attach the worker's live proxy view.
    pub fn with_live(mut self, live: LiveProxies) -> Self {
        self.live = Some(live);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored list. Unreadable files yield an empty list.
    pub async fn load(&self) -> Vec<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_lines(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Proxy file missing, using empty list");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read proxy file");
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted list with `entries` and publish it.
    pub async fn replace(&self, entries: Vec<String>) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;

        let body: String = entries.iter().map(|p| format!("{p}\n")).collect();
        let result = atomic_write_file(&self.path, body.as_bytes())
            .await
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            });
        metrics::record_store_write("proxies", result.is_ok());
        result?;

        let count = entries.len();
        match &self.live {
            Some(live) => {
                live.publish(entries);
                metrics::record_proxy_count(count);
            }
            None => tracing::debug!("No worker attached, live proxy set not updated"),
        }

        tracing::info!(path = %self.path.display(), count, "Updated proxy list");
        Ok(count)
    }

    /// Publish the persisted list to the live view, as done at startup.
    pub async fn publish_stored(&self) -> usize {
        let stored = self.load().await;
        let count = stored.len();
        if let Some(live) = &self.live {
            live.publish(stored);
            metrics::record_proxy_count(count);
        }
        count
    }
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
