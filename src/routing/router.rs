//! Command dispatch.
//!
//! Routing → Authorizing → Executing → Replied. Every failure after routing
//! becomes exactly one reply; nothing propagates to the channel loop.

use serde_json::Value;
use std::sync::Arc;

use crate::channel::{Format, InboundMessage, OutboundMessage};
use crate::observability::metrics;
use crate::routing::command::{classify, Command, CommandKind, Inbound};
use crate::routing::error::{CommandError, ValidationError};
use crate::routing::input;
use crate::routing::replies;
use crate::security::AuthorizationGate;
use crate::store::{ConfigStore, ProxyStore};
use crate::worker::{WorkerAction, WorkerHandle};

/// A reply to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: Format,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: Format::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: Format::Markdown,
        }
    }

    pub fn to(self, recipient: &str) -> OutboundMessage {
        OutboundMessage {
            recipient: recipient.to_string(),
            content: self.text,
            format: self.format,
        }
    }
}

/// Maps inbound messages to handlers behind the admin gate.
pub struct CommandRouter {
    gate: AuthorizationGate,
    config: Arc<ConfigStore>,
    proxies: Arc<ProxyStore>,
    worker: WorkerHandle,
}

impl CommandRouter {
    pub fn new(
        gate: AuthorizationGate,
        config: Arc<ConfigStore>,
        proxies: Arc<ProxyStore>,
        worker: WorkerHandle,
    ) -> Self {
        Self {
            gate,
            config,
            proxies,
            worker,
        }
    }

    /// Handle one inbound message. `None` means the message is not for us
    /// and gets no reply.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Option<Reply> {
        let inbound = classify(msg);
        let label = inbound.label();
        let invoker = inbound.invoker()?;

        tracing::debug!(message_id = %msg.id, command = label, invoker = %invoker, "Routing message");

        if !self.gate.verify(invoker) {
            return Some(Reply::plain(CommandError::Unauthorized.reply_text(label)));
        }

        let result = match inbound {
            Inbound::Command(cmd) => self.execute(&cmd).await,
            Inbound::UnknownCommand { token, .. } => {
                Err(ValidationError::UnknownCommand(token).into())
            }
            Inbound::DirectConfig { value, .. } => self.apply_direct_config(value).await,
            Inbound::Ignored => return None,
        };

        metrics::record_command(label, result.is_ok());
        Some(match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(command = label, error = %e, "Command failed");
                Reply::plain(e.reply_text(label))
            }
        })
    }

    /// Run an already authorized command.
    pub async fn execute(&self, cmd: &Command) -> Result<Reply, CommandError> {
        match cmd.kind {
            CommandKind::Start => Ok(Reply::markdown(replies::WELCOME)),
            CommandKind::Help => Ok(Reply::markdown(replies::HELP)),
            CommandKind::Status => self.status("📊 *Farming Status*").await,
            CommandKind::StartFarming => {
                self.lifecycle(WorkerAction::Start).await?;
                self.status("✅ *Farming Started Successfully*").await
            }
            CommandKind::StopFarming => {
                self.lifecycle(WorkerAction::Stop).await?;
                self.status("🛑 *Farming Stopped*").await
            }
            CommandKind::Restart => {
                self.lifecycle(WorkerAction::Restart).await?;
                self.status("🔄 *Worker Restarted*").await
            }
            CommandKind::UpdateProxies => self.update_proxies(cmd).await,
            CommandKind::UpdateConfig => self.update_config(cmd).await,
            CommandKind::ViewConfig => {
                let config = self.config.load().await;
                Ok(Reply::markdown(format!(
                    "⚙️ *Current configuration:*\n```\n{}\n```",
                    config.to_pretty_json()
                )))
            }
            CommandKind::ViewProxies => {
                let proxies = self.proxies.load().await;
                if proxies.is_empty() {
                    return Ok(Reply::plain(replies::NO_PROXIES));
                }
                Ok(Reply::plain(format!(
                    "📋 Current proxies ({}):\n{}",
                    proxies.len(),
                    proxies.join("\n")
                )))
            }
        }
    }

    async fn lifecycle(&self, action: WorkerAction) -> Result<(), CommandError> {
        let result = match action {
            WorkerAction::Start => self.worker.start().await,
            WorkerAction::Stop => self.worker.stop().await,
            WorkerAction::Restart => self.worker.restart().await,
        };
        Ok(result?)
    }

    async fn status(&self, heading: &str) -> Result<Reply, CommandError> {
        let state = self.worker.state().await?;
        let config = self.config.load().await;
        let proxies = self.proxies.load().await;

        Ok(Reply::markdown(format!(
            "{heading}\n\n• 👥 Users: {}\n• 🔄 Proxies: {}\n• 🏃 Status: {state}",
            config.user_id_count(),
            proxies.len(),
        )))
    }

    async fn update_proxies(&self, cmd: &Command) -> Result<Reply, CommandError> {
        let inline = input::proxies_from_args(&cmd.args);
        if !inline.is_empty() {
            let count = self.proxies.replace(inline).await?;
            return Ok(Reply::plain(format!(
                "✅ Updated proxy list with {count} proxies"
            )));
        }

        let Some(replied) = cmd.reply_to_text.as_deref() else {
            return Ok(Reply::markdown(replies::UPDATE_PROXIES_USAGE));
        };
        let entries = input::proxies_from_reply(replied)?;
        let count = self.proxies.replace(entries).await?;
        Ok(Reply::plain(format!(
            "✅ Updated proxy list with {count} proxies from replied message"
        )))
    }

    async fn update_config(&self, cmd: &Command) -> Result<Reply, CommandError> {
        let (payload, source) = match (cmd.argument_text(), cmd.reply_to_text.as_deref()) {
            ("", Some(replied)) => (replied, " from replied message"),
            ("", None) => return Ok(Reply::markdown(replies::UPDATE_CONFIG_USAGE)),
            (inline, _) => (inline, ""),
        };

        let update = input::config_update(payload)?;
        let count = update.user_id_count();
        self.config.merge(update).await?;
        Ok(Reply::plain(format!(
            "✅ Config updated with {count} user IDs{source}"
        )))
    }

    async fn apply_direct_config(&self, value: Value) -> Result<Reply, CommandError> {
        let update = input::direct_config(value)?;
        let count = update.user_id_count();
        self.config.merge(update).await?;
        Ok(Reply::plain(format!(
            "✅ Config updated with {count} user IDs from message"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_addressing() {
        let msg = Reply::markdown("*hi*").to("-100");
        assert_eq!(msg.recipient, "-100");
        assert_eq!(msg.content, "*hi*");
        assert_eq!(msg.format, Format::Markdown);
    }
}
