//! Settings schema definitions.
//!
//! This module defines the runtime settings of the control bot. All types
//! derive Serde traits for deserialization from a TOML settings file, and
//! every field has a default so an absent file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root settings for the control bot.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControlSettings {
    /// Locations of the persisted configuration and proxy files.
    pub storage: StorageSettings,

    /// Worker launch settings.
    pub worker: WorkerSettings,

    /// Telegram transport settings.
    pub telegram: TelegramSettings,

    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Backing files of the two stores.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON configuration object consumed by the worker.
    pub config_path: PathBuf,

    /// Proxy list, one URI per line.
    pub proxy_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            proxy_path: PathBuf::from("proxy.txt"),
        }
    }
}

/// Worker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Delay before the worker is first started, in seconds.
    pub startup_delay_secs: u64,

    /// External program that performs the farming work.
    pub command: Option<String>,

    /// Arguments passed to `command`.
    pub args: Vec<String>,
}

impl WorkerSettings {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            startup_delay_secs: 5,
            command: None,
            args: Vec::new(),
        }
    }
}

/// Telegram Bot API settings. The bot token is never read from this file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot API base URL, without the `bot<token>` suffix.
    pub api_base: String,

    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 25,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: ControlSettings = toml::from_str(
            r#"
            [worker]
            startup_delay_secs = 1
            command = "grassbot"
            "#,
        )
        .unwrap();

        assert_eq!(settings.worker.startup_delay(), Duration::from_secs(1));
        assert_eq!(settings.worker.command.as_deref(), Some("grassbot"));
        assert!(settings.worker.args.is_empty());
        assert_eq!(settings.storage.config_path, PathBuf::from("config.json"));
        assert_eq!(settings.telegram.poll_timeout_secs, 25);
    }
}
