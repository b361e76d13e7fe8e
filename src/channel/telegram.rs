//! Telegram channel adapter.
//!
//! Uses the Bot API long-polling (`getUpdates`) to receive messages and
//! `sendMessage` to deliver replies. Replies are split into 4096-character
//! chunks to comply with Telegram's limit.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::channel::{Channel, ChannelError, Format, InboundMessage, OutboundMessage};
use crate::config::TelegramSettings;

const MAX_MESSAGE_LEN: usize = 4096;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Split a long message into chunks of at most 4096 characters, preferring
/// newline boundaries.
pub fn split_message(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(MAX_MESSAGE_LEN)
            .map_or(rest.len(), |(i, _)| i);
        let window = &rest[..end];
        let split_at = if end < rest.len() {
            window.rfind('\n').map_or(end, |p| p + 1)
        } else {
            end
        };
        chunks.push(rest[..split_at].to_string());
        rest = &rest[split_at..];
    }
    chunks
}

/// Map one `getUpdates` entry to an inbound message.
///
/// Updates without a text message or without a sender are skipped.
pub fn parse_update(update: &Value) -> Option<InboundMessage> {
    let msg = update.get("message")?;
    let text = msg.get("text").and_then(Value::as_str)?;
    let sender = msg["from"]["id"].as_i64()?.to_string();
    let reply_target = msg["chat"]["id"].as_i64()?.to_string();
    let id = msg["message_id"]
        .as_i64()
        .or_else(|| update["update_id"].as_i64())
        .unwrap_or(0)
        .to_string();
    let reply_to_text = msg["reply_to_message"]["text"].as_str().map(String::from);

    Some(InboundMessage {
        id,
        sender,
        reply_target,
        text: text.to_string(),
        reply_to_text,
    })
}

pub struct TelegramChannel {
    base_url: String,
    poll_timeout_secs: u64,
    client: Client,
    /// Next `getUpdates` offset. Kept across listener restarts so
    /// acknowledged updates are never delivered twice.
    offset: AtomicI64,
}

impl TelegramChannel {
    pub fn new(bot_token: &str, settings: &TelegramSettings) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            base_url: format!(
                "{}/bot{}",
                settings.api_base.trim_end_matches('/'),
                bot_token
            ),
            poll_timeout_secs: settings.poll_timeout_secs,
            client,
            offset: AtomicI64::new(0),
        })
    }

    /// Mark `update_id` as consumed.
    fn acknowledge(&self, update_id: i64) {
        self.offset.fetch_max(update_id + 1, Ordering::SeqCst);
    }

    fn next_offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<reqwest::Response, ChannelError> {
        Ok(self.client.post(self.api_url(method)).json(body).send().await?)
    }

    async fn send_chunk(&self, recipient: &str, chunk: &str, format: Format) -> Result<(), ChannelError> {
        let mut body = json!({ "chat_id": recipient, "text": chunk });
        if format == Format::Markdown {
            body["parse_mode"] = json!("Markdown");
        }

        let resp = self.post("sendMessage", &body).await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if format == Format::Markdown && status == reqwest::StatusCode::BAD_REQUEST {
            // Operator data can break Markdown entities; fall back to plain text.
            tracing::debug!(error = %text, "Markdown rejected, resending as plain text");
            let plain = json!({ "chat_id": recipient, "text": chunk });
            let resp = self.post("sendMessage", &plain).await?;
            if resp.status().is_success() {
                return Ok(());
            }
            let text = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("sendMessage failed: {text}")));
        }
        Err(ChannelError::Api(format!("sendMessage failed ({status}): {text}")))
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        for chunk in split_message(&message.content) {
            self.send_chunk(&message.recipient, &chunk, message.format).await?;
        }
        Ok(())
    }

    async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> Result<(), ChannelError> {
        let timeout = self.poll_timeout_secs.to_string();
        loop {
            let offset_param = self.next_offset().to_string();
            let resp = self
                .client
                .get(self.api_url("getUpdates"))
                .query(&[
                    ("timeout", timeout.as_str()),
                    ("offset", offset_param.as_str()),
                    ("allowed_updates", r#"["message"]"#),
                ])
                .send()
                .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "Telegram poll error");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let preview: String = body.chars().take(320).collect();
                tracing::warn!(status = %status, body = %preview, "Telegram getUpdates failed");
                if status == reqwest::StatusCode::UNAUTHORIZED {
                    return Err(ChannelError::Api("bot token rejected".to_string()));
                }
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }

            let json: Value = match resp.json().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "Telegram JSON parse error");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(updates) = json.get("result").and_then(Value::as_array) else {
                tracing::debug!("Telegram response without result array");
                continue;
            };

            for update in updates {
                if let Some(update_id) = update["update_id"].as_i64() {
                    self.acknowledge(update_id);
                }

                let Some(message) = parse_update(update) else {
                    continue;
                };
                if tx.send(message).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    async fn register_commands(&self, commands: &[(&str, &str)]) -> Result<(), ChannelError> {
        let list: Vec<Value> = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect();
        let resp = self.post("setMyCommands", &json!({ "commands": list })).await?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("setMyCommands failed: {text}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_message() {
        let msg = "Hello, world!";
        assert_eq!(split_message(msg), vec![msg.to_string()]);
    }

    #[test]
    fn test_split_long_message() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
        }
        assert_eq!(chunks.join(""), msg);
    }

    #[test]
    fn test_split_prefers_newlines_and_char_boundaries() {
        let line = format!("{}\n", "é".repeat(99));
        let msg = line.repeat(60);
        let chunks = split_message(&msg);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.ends_with('\n'));
            assert!(chunk.chars().count() <= MAX_MESSAGE_LEN);
        }
        assert_eq!(chunks.concat(), msg);
    }

    #[test]
    fn test_offset_is_kept_on_the_channel() {
        let channel = TelegramChannel::new("123:abc", &TelegramSettings::default()).unwrap();
        assert_eq!(channel.next_offset(), 0);

        channel.acknowledge(41);
        // late or repeated ids never move the offset back
        channel.acknowledge(40);
        channel.acknowledge(41);
        assert_eq!(channel.next_offset(), 42);
    }

    #[tokio::test]
    async fn test_offset_survives_aborted_listener() {
        let channel = std::sync::Arc::new(
            TelegramChannel::new(
                "123:abc",
                &TelegramSettings {
                    api_base: "http://127.0.0.1:9".into(),
                    poll_timeout_secs: 1,
                },
            )
            .unwrap(),
        );
        channel.acknowledge(99);

        let (tx, _rx) = mpsc::channel(1);
        let listener = channel.clone();
        let task = tokio::spawn(async move { listener.listen(tx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();
        let _ = task.await;

        assert_eq!(channel.next_offset(), 100);
    }

    #[test]
    fn test_parse_update() {
        let update = json!({
            "update_id": 10,
            "message": {
                "message_id": 7,
                "from": {"id": 4242, "username": "op"},
                "chat": {"id": -100},
                "text": "/update_proxies",
                "reply_to_message": {"text": "http://a:1\nhttp://b:2"}
            }
        });
        let msg = parse_update(&update).unwrap();
        assert_eq!(msg.id, "7");
        assert_eq!(msg.sender, "4242");
        assert_eq!(msg.reply_target, "-100");
        assert_eq!(msg.text, "/update_proxies");
        assert_eq!(msg.reply_to_text.as_deref(), Some("http://a:1\nhttp://b:2"));
    }

    #[test]
    fn test_parse_update_skips_non_text() {
        let update = json!({
            "update_id": 11,
            "message": {"message_id": 8, "from": {"id": 1}, "chat": {"id": 1}, "sticker": {}}
        });
        assert!(parse_update(&update).is_none());
        assert!(parse_update(&json!({"update_id": 12})).is_none());
    }
}
