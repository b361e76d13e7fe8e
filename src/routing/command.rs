//! Inbound message classification.
//!
//! # Design Decisions
//! - Closed set of commands with a static token table
//! - Commands are `/token` or `/token@botname` as the first word, or a
//!   message that is exactly a bare `token`
//! - Only the slashed form can be an unknown command
//! - Anything else is offered to the JSON path; non-JSON text is ignored

use serde_json::Value;

use crate::channel::InboundMessage;

/// The commands understood by the control bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Status,
    StartFarming,
    StopFarming,
    UpdateProxies,
    UpdateConfig,
    ViewConfig,
    ViewProxies,
    Restart,
    Help,
}

/// Token and menu description for each command, in menu order.
const TABLE: [(CommandKind, &str, &str); 10] = [
    (CommandKind::Start, "start", "Start the bot"),
    (CommandKind::Status, "status", "Check bot status"),
    (CommandKind::StartFarming, "start_farming", "Start farming process"),
    (CommandKind::StopFarming, "stop_farming", "Stop farming process"),
    (CommandKind::UpdateProxies, "update_proxies", "Update proxy list"),
    (CommandKind::UpdateConfig, "update_config", "Update configuration"),
    (CommandKind::ViewConfig, "view_config", "View current configuration"),
    (CommandKind::ViewProxies, "view_proxies", "View current proxies"),
    (CommandKind::Restart, "restart", "Restart bot"),
    (CommandKind::Help, "help", "Show help message"),
];

impl CommandKind {
    pub fn from_token(token: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, t, _)| *t == token)
            .map(|(kind, _, _)| *kind)
    }

    pub fn token(self) -> &'static str {
        TABLE
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map_or("unknown", |(_, token, _)| token)
    }

    /// `(token, description)` pairs for the platform command menu.
    pub fn menu() -> Vec<(&'static str, &'static str)> {
        TABLE.iter().map(|(_, token, desc)| (*token, *desc)).collect()
    }
}

/// A recognized command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Whitespace-separated words after the command token.
    pub args: Vec<String>,
    /// Identity of the sender.
    pub invoker: String,
    /// Full message text.
    pub raw: String,
    /// Text of the replied-to message, if any.
    pub reply_to_text: Option<String>,
}

impl Command {
    /// Everything after the command token, with inner spacing intact.
    pub fn argument_text(&self) -> &str {
        let trimmed = self.raw.trim_start();
        trimmed
            .find(char::is_whitespace)
            .map_or("", |i| trimmed[i..].trim())
    }
}

/// What an inbound message turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(Command),
    /// Looks like a command but names none we know.
    UnknownCommand { token: String, invoker: String },
    /// Parsed as JSON; offered as a direct configuration update.
    DirectConfig { value: Value, invoker: String },
    /// Neither a command nor JSON. Dropped without reply.
    Ignored,
}

impl Inbound {
    pub fn invoker(&self) -> Option<&str> {
        match self {
            Inbound::Command(cmd) => Some(&cmd.invoker),
            Inbound::UnknownCommand { invoker, .. } | Inbound::DirectConfig { invoker, .. } => {
                Some(invoker)
            }
            Inbound::Ignored => None,
        }
    }

    /// Metrics and log label.
    pub fn label(&self) -> &'static str {
        match self {
            Inbound::Command(cmd) => cmd.kind.token(),
            Inbound::UnknownCommand { .. } => "unknown",
            Inbound::DirectConfig { .. } => "direct_config",
            Inbound::Ignored => "ignored",
        }
    }
}

/// Classify an inbound message.
pub fn classify(msg: &InboundMessage) -> Inbound {
    let text = msg.text.trim();

    if let Some(body) = text.strip_prefix('/') {
        let mut words = body.split_whitespace();
        let first = words.next().unwrap_or_default();
        let token = first.split_once('@').map_or(first, |(t, _)| t);

        return match CommandKind::from_token(token) {
            Some(kind) => Inbound::Command(Command {
                kind,
                args: words.map(String::from).collect(),
                invoker: msg.sender.clone(),
                raw: text.to_string(),
                reply_to_text: msg.reply_to_text.clone(),
            }),
            None => Inbound::UnknownCommand {
                token: token.to_string(),
                invoker: msg.sender.clone(),
            },
        };
    }

    // Without a slash only the exact token counts; "restart the router" is chatter.
    if let Some(kind) = CommandKind::from_token(text) {
        return Inbound::Command(Command {
            kind,
            args: Vec::new(),
            invoker: msg.sender.clone(),
            raw: text.to_string(),
            reply_to_text: msg.reply_to_text.clone(),
        });
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Inbound::DirectConfig {
            value,
            invoker: msg.sender.clone(),
        },
        Err(_) => Inbound::Ignored,
    }
}
