//! Worker configuration file.
//!
//! # Responsibilities
//! - Load the JSON object, degrading to `{}` on any failure
//! - Shallow merge of operator updates
//! - Atomic full-file rewrite after each merge

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::observability::metrics;
use crate::store::atomic::atomic_write_file;
use crate::store::StorageError;

/// Key holding the ordered list of farming account identities.
pub const USER_IDS_KEY: &str = "user_ids";

/// A JSON object of worker settings. Keys other than `user_ids` are opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries under `user_ids`, 0 when absent or not an array.
    pub fn user_id_count(&self) -> usize {
        self.0
            .get(USER_IDS_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Top-level overwrite: keys in `update` replace ours, nested values wholesale.
    pub fn merge(&mut self, update: Configuration) {
        for (key, value) in update.0 {
            self.0.insert(key, value);
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// File-backed configuration store.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    /// Held across read-merge-write so overlapping merges serialize.
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored configuration. Never fails: unreadable or invalid
    /// content yields an empty object.
    pub async fn load(&self) -> Configuration {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Config file missing, using empty object");
                return Configuration::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read config file");
                return Configuration::new();
            }
        };

        match serde_json::from_str::<Value>(&content).map(Configuration::from_value) {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::warn!(path = %self.path.display(), "Config file is not a JSON object");
                Configuration::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to parse config file");
                Configuration::new()
            }
        }
    }

    /// Merge `update` into the stored object and persist the result.
    pub async fn merge(&self, update: Configuration) -> Result<Configuration, StorageError> {
        let _guard = self.write_lock.lock().await;

        let applied = update.user_id_count();
        let mut config = self.load().await;
        config.merge(update);

        let result = self.persist(&config).await;
        metrics::record_store_write("config", result.is_ok());
        result?;

        tracing::info!(
            path = %self.path.display(),
            user_ids = applied,
            "Config updated"
        );
        Ok(config)
    }

    async fn persist(&self, config: &Configuration) -> Result<(), StorageError> {
        let mut body = serde_json::to_vec_pretty(config)?;
        body.push(b'\n');
        atomic_write_file(&self.path, &body)
            .await
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> Configuration {
        Configuration::from_value(value).unwrap()
    }

    #[test]
    fn test_merge_adds_keys() {
        let mut base = config(json!({"a": 1}));
        base.merge(config(json!({"b": 2})));
        assert_eq!(base, config(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_merge_overwrites_top_level() {
        let mut base = config(json!({"a": 1}));
        base.merge(config(json!({"a": 2})));
        assert_eq!(base, config(json!({"a": 2})));
    }

    #[test]
    fn test_merge_replaces_nested_wholesale() {
        let mut base = config(json!({"limits": {"rps": 1, "burst": 5}}));
        base.merge(config(json!({"limits": {"rps": 9}})));
        assert_eq!(base, config(json!({"limits": {"rps": 9}})));
    }

    #[test]
    fn test_user_id_count() {
        assert_eq!(config(json!({"user_ids": ["a", "b"]})).user_id_count(), 2);
        assert_eq!(config(json!({"user_ids": "a"})).user_id_count(), 0);
        assert_eq!(Configuration::new().user_id_count(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupted_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);
        assert!(store.load().await.is_empty());

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_merge_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"a": 1, "user_ids": ["old"]}"#).unwrap();
        let store = ConfigStore::new(&path);

        let merged = store
            .merge(config(json!({"user_ids": ["u1", "u2"]})))
            .await
            .unwrap();
        assert_eq!(merged, config(json!({"a": 1, "user_ids": ["u1", "u2"]})));

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"a": 1, "user_ids": ["u1", "u2"]}));
    }

    #[tokio::test]
    async fn test_empty_merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::new(&path);
        store
            .merge(config(json!({"user_ids": ["u1"], "nested": {"x": [1, 2]}})))
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let loaded = store.load().await;
        let merged = store.merge(Configuration::new()).await.unwrap();

        assert_eq!(loaded, merged);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_merges_keep_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(ConfigStore::new(dir.path().join("config.json")));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.spawn(async move {
                let mut map = Map::new();
                map.insert(format!("k{i}"), json!(i));
                store.merge(Configuration::from(map)).await.unwrap();
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        assert_eq!(store.load().await.len(), 8);
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("missing").join("config.json"));
        let result = store.merge(config(json!({"a": 1}))).await;
        assert!(matches!(result, Err(StorageError::Write { .. })));
    }
}
