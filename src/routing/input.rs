//! Operator payload extraction for the mutating commands.

use serde_json::Value;

use crate::routing::error::ValidationError;
use crate::store::{Configuration, USER_IDS_KEY};

/// Proxies given inline are taken verbatim, minus empty tokens.
pub fn proxies_from_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// Proxies pasted in an earlier message: one per line, `http`-prefixed only.
pub fn proxies_from_reply(text: &str) -> Result<Vec<String>, ValidationError> {
    let proxies: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.starts_with("http"))
        .map(String::from)
        .collect();

    if proxies.is_empty() {
        return Err(ValidationError::NoValidProxies);
    }
    Ok(proxies)
}

/// Parse an `update_config` payload. Any JSON object is accepted.
pub fn config_update(text: &str) -> Result<Configuration, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ValidationError::MalformedJson)?;
    Configuration::from_value(value).ok_or(ValidationError::NotAnObject)
}

/// Check a free-text JSON message. It must be an object carrying `user_ids`.
pub fn direct_config(value: Value) -> Result<Configuration, ValidationError> {
    let config = Configuration::from_value(value).ok_or(ValidationError::MissingUserIds)?;
    match config.get(USER_IDS_KEY) {
        None => Err(ValidationError::MissingUserIds),
        Some(Value::Array(_)) => Ok(config),
        // The key is present but not a list. Refused here instead of merged,
        // unlike `config_update` which stores any object as given.
        Some(_) => Err(ValidationError::InvalidUserIds),
    }
}
