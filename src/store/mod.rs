//! Persistent stores.
//!
//! # Data Flow
//! ```text
//! startup:
//!     config.json → ConfigStore::load → worker
//!     proxy.txt   → ProxyStore::publish_stored → LiveProxies → worker
//!
//! operator command:
//!     update → ConfigStore::merge → atomic rewrite of config.json
//!     list   → ProxyStore::replace → atomic rewrite of proxy.txt → LiveProxies
//! ```
//!
//! # Design Decisions
//! - Reads never fail the caller: missing or corrupt files degrade to empty
//! - Writes go through a temp file and rename
//! - Each store serializes its own mutations; across processes last write wins

pub mod atomic;
pub mod config_store;
pub mod proxy_store;

use std::path::PathBuf;
use thiserror::Error;

pub use config_store::{ConfigStore, Configuration, USER_IDS_KEY};
pub use proxy_store::ProxyStore;

/// Errors persisting a store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}
