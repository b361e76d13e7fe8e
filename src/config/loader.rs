//! Settings and credential loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ControlSettings;
use crate::config::validation::{validate_settings, SettingsIssue};
use crate::security::{AdminSet, AdminSetError};

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the JSON array of admin identities.
pub const ADMIN_IDS_ENV: &str = "ADMIN_CHAT_IDS";

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_issues(.0))]
    Validation(Vec<SettingsIssue>),
}

fn join_issues(issues: &[SettingsIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<ControlSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: ControlSettings = toml::from_str(&content)?;

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok(settings)
}

/// Secrets and identities taken from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub admins: AdminSet,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("admins", &self.admins.len())
            .finish()
    }
}

/// Error type for credential loading.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,

    #[error("ADMIN_CHAT_IDS is malformed: {0}")]
    AdminIds(#[from] AdminSetError),
}

impl Credentials {
    /// Read the credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(BOT_TOKEN_ENV)
            .filter(|token| !token.trim().is_empty())
            .ok_or(CredentialsError::MissingToken)?;

        let admins = match lookup(ADMIN_IDS_ENV) {
            Some(raw) => AdminSet::from_json(&raw)?,
            None => {
                tracing::warn!("{} not set, every sender will be refused", ADMIN_IDS_ENV);
                AdminSet::default()
            }
        };

        Ok(Self { bot_token, admins })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let result = Credentials::from_lookup(env(&[(ADMIN_IDS_ENV, r#"["1"]"#)]));
        assert!(matches!(result, Err(CredentialsError::MissingToken)));

        let result = Credentials::from_lookup(env(&[(BOT_TOKEN_ENV, "  ")]));
        assert!(matches!(result, Err(CredentialsError::MissingToken)));
    }

    #[test]
    fn test_admins_default_to_empty() {
        let creds = Credentials::from_lookup(env(&[(BOT_TOKEN_ENV, "123:abc")])).unwrap();
        assert!(creds.admins.is_empty());
    }

    #[test]
    fn test_malformed_admins_are_rejected() {
        let result = Credentials::from_lookup(env(&[
            (BOT_TOKEN_ENV, "123:abc"),
            (ADMIN_IDS_ENV, "not json"),
        ]));
        assert!(matches!(result, Err(CredentialsError::AdminIds(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::from_lookup(env(&[(BOT_TOKEN_ENV, "123:secret")])).unwrap();
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_load_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farmctl.toml");
        std::fs::write(&path, "[telegram]\npoll_timeout_secs = 10\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.telegram.poll_timeout_secs, 10);

        std::fs::write(&path, "[telegram]\npoll_timeout_secs = 0\n").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SettingsError::Validation(_))
        ));
    }
}
