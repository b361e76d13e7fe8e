//! Messaging channel subsystem.
//!
//! # Data Flow
//! ```text
//! chat platform
//!     → Channel::listen (long poll)
//!     → mpsc::Sender<InboundMessage>
//!     → lifecycle::orchestrator (one task per message)
//!     → routing::CommandRouter
//!     → Channel::send (reply)
//! ```
//!
//! # Design Decisions
//! - Transport knows nothing about commands or admins
//! - `listen` returns when the receiver side is dropped

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use telegram::TelegramChannel;

/// A parsed inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Transport-level message id.
    pub id: String,
    /// Identity of the sender, checked against the admin set.
    pub sender: String,
    /// Where replies go (the chat id).
    pub reply_target: String,
    /// Message text.
    pub text: String,
    /// Text of the message this one replies to, if any.
    pub reply_to_text: Option<String>,
}

/// Text formatting of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Plain,
    Markdown,
}

/// An outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub content: String,
    pub format: Format,
}

/// Errors talking to the chat platform.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),
}

/// A chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;

    /// Receive messages until `tx` is closed.
    async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> Result<(), ChannelError>;

    /// Advertise the command menu. Optional for transports without one.
    async fn register_commands(&self, _commands: &[(&str, &str)]) -> Result<(), ChannelError> {
        Ok(())
    }
}
