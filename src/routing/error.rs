//! Handler error taxonomy.

use thiserror::Error;

use crate::security::REFUSAL;
use crate::store::StorageError;
use crate::worker::WorkerError;

/// Operator input that was understood as a command but cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON format")]
    MalformedJson,

    #[error("Configuration must be a JSON object")]
    NotAnObject,

    #[error("JSON must contain 'user_ids' field")]
    MissingUserIds,

    #[error("'user_ids' must be an array")]
    InvalidUserIds,

    #[error("No valid proxies found in replied message")]
    NoValidProxies,

    #[error("Unknown command: /{0}. Send /help for the command list")]
    UnknownCommand(String),
}

/// Anything that stops a command from completing.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("sender is not an admin")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl CommandError {
    /// The single user-visible reply for this failure.
    pub fn reply_text(&self, command: &str) -> String {
        match self {
            CommandError::Unauthorized => REFUSAL.to_string(),
            CommandError::Validation(e) => format!("❌ {e}"),
            CommandError::Storage(_) => {
                format!("❌ Error running /{command}: could not save changes")
            }
            CommandError::Worker(e) => format!("❌ Error running /{command}: {e}"),
        }
    }
}
