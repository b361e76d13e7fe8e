//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (poll timeout > 0, metrics address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControlSettings → Result<(), Vec<SettingsIssue>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ControlSettings;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsIssue {
    #[error("storage.{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("storage.config_path and storage.proxy_path must differ")]
    SharedPath,

    #[error("telegram.poll_timeout_secs must be greater than zero")]
    ZeroPollTimeout,

    #[error("worker.command must not be blank")]
    BlankWorkerCommand,

    #[error("invalid observability.metrics_address: {0}")]
    MetricsAddress(String),
}

/// Check the settings, collecting every problem found.
pub fn validate_settings(settings: &ControlSettings) -> Result<(), Vec<SettingsIssue>> {
    let mut issues = Vec::new();

    if settings.storage.config_path.as_os_str().is_empty() {
        issues.push(SettingsIssue::EmptyPath("config_path"));
    }
    if settings.storage.proxy_path.as_os_str().is_empty() {
        issues.push(SettingsIssue::EmptyPath("proxy_path"));
    }
    if settings.storage.config_path == settings.storage.proxy_path {
        issues.push(SettingsIssue::SharedPath);
    }
    if settings.telegram.poll_timeout_secs == 0 {
        issues.push(SettingsIssue::ZeroPollTimeout);
    }
    if let Some(command) = &settings.worker.command {
        if command.trim().is_empty() {
            issues.push(SettingsIssue::BlankWorkerCommand);
        }
    }
    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        issues.push(SettingsIssue::MetricsAddress(
            settings.observability.metrics_address.clone(),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
