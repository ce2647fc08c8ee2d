//! Telegram Bot API channel implementation.
//!
//! Uses the Telegram Bot API via reqwest for `getUpdates` long polling and
//! `sendMessage` / `sendDocument` / `sendChatAction` replies.
//! In tests, a `TelegramHttpClient` trait abstraction allows mocking.

use super::{
    Channel, ChannelStatus, ChatAction, ChatSink, InboundMessage, MessageId, Reply, TextFormat,
    split_html_message, split_message,
};
use crate::error::{BriefbotError, ChannelError};
use crate::types::ChatId;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Telegram's limit on a single text message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Configuration for a Telegram channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// If non-empty, messages from other chats are ignored.
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
    pub polling_timeout_secs: u64,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            allowed_chat_ids: Vec::new(),
            polling_timeout_secs: 30,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

/// Trait for HTTP interactions, allowing test mocking.
#[async_trait]
pub trait TelegramHttpClient: Send + Sync {
    async fn get_me(&self) -> Result<String, String>;
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<String, String>;
    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        data: Bytes,
        caption: Option<&str>,
    ) -> Result<String, String>;
    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), String>;
    async fn get_updates(&self, offset: i64, timeout_secs: u64)
    -> Result<Vec<TelegramUpdate>, String>;
}

/// A Telegram update from the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub chat_id: i64,
    pub from_id: i64,
    pub from_name: String,
    pub text: String,
}

/// Telegram channel using the Bot API.
pub struct TelegramChannel {
    config: TelegramConfig,
    status: ChannelStatus,
    http_client: Box<dyn TelegramHttpClient>,
    next_offset: AtomicI64,
    name: String,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig, http_client: Box<dyn TelegramHttpClient>) -> Self {
        Self {
            config,
            status: ChannelStatus::Disconnected,
            http_client,
            next_offset: AtomicI64::new(0),
            name: "telegram".to_string(),
        }
    }

    /// Offset passed to the next `getUpdates` call.
    pub fn next_offset(&self) -> i64 {
        self.next_offset.load(Ordering::SeqCst)
    }

    fn is_allowed(&self, chat_id: i64) -> bool {
        self.config.allowed_chat_ids.is_empty() || self.config.allowed_chat_ids.contains(&chat_id)
    }

    fn send_failed(&self, message: String) -> BriefbotError {
        BriefbotError::Channel(ChannelError::SendFailed {
            name: self.name.clone(),
            message,
        })
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), BriefbotError> {
        if self.config.bot_token.is_empty() {
            self.status = ChannelStatus::Failed;
            return Err(BriefbotError::Channel(ChannelError::AuthFailed {
                name: self.name.clone(),
            }));
        }
        match self.http_client.get_me().await {
            Ok(username) => {
                debug!(channel = self.name.as_str(), bot = username.as_str(), "Telegram bot authenticated");
                self.status = ChannelStatus::Connected;
                Ok(())
            }
            Err(e) => {
                self.status = ChannelStatus::Failed;
                Err(BriefbotError::Channel(ChannelError::ConnectionFailed {
                    name: self.name.clone(),
                    message: e,
                }))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), BriefbotError> {
        self.status = ChannelStatus::Disconnected;
        Ok(())
    }

    async fn receive_messages(&self) -> Result<Vec<InboundMessage>, BriefbotError> {
        let updates = self
            .http_client
            .get_updates(self.next_offset(), self.config.polling_timeout_secs)
            .await
            .map_err(|e| {
                BriefbotError::Channel(ChannelError::ConnectionFailed {
                    name: self.name.clone(),
                    message: e,
                })
            })?;

        // Acknowledge every update, including ones we skip below.
        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            self.next_offset.fetch_max(max_id + 1, Ordering::SeqCst);
        }

        let messages = updates
            .into_iter()
            .filter(|u| {
                let allowed = self.is_allowed(u.chat_id);
                if !allowed {
                    debug!(chat_id = u.chat_id, "Ignoring update from chat not in allow-list");
                }
                allowed && !u.text.trim().is_empty()
            })
            .map(|u| {
                InboundMessage::new(u.chat_id, u.text)
                    .with_update_id(u.update_id)
                    .with_sender(u.from_id, u.from_name)
            })
            .collect();

        Ok(messages)
    }

    fn status(&self) -> ChannelStatus {
        self.status
    }
}

#[async_trait]
impl ChatSink for TelegramChannel {
    async fn deliver(&self, chat_id: ChatId, reply: Reply) -> Result<MessageId, BriefbotError> {
        match reply {
            Reply::Text { text, format } => {
                let (parse_mode, chunks) = match format {
                    TextFormat::Plain => (None, split_message(&text, MAX_MESSAGE_LENGTH)),
                    TextFormat::Html => {
                        (Some("HTML"), split_html_message(&text, MAX_MESSAGE_LENGTH))
                    }
                };
                let mut last_id = String::new();
                for chunk in chunks {
                    last_id = self
                        .http_client
                        .send_message(chat_id.0, &chunk, parse_mode)
                        .await
                        .map_err(|e| self.send_failed(e))?;
                }
                Ok(MessageId::new(last_id))
            }
            Reply::Document { report, caption } => self
                .http_client
                .send_document(chat_id.0, &report.filename, report.bytes, caption.as_deref())
                .await
                .map(MessageId::new)
                .map_err(|e| self.send_failed(e)),
        }
    }

    async fn show_action(&self, chat_id: ChatId, action: ChatAction) {
        if let Err(e) = self
            .http_client
            .send_chat_action(chat_id.0, action.as_api_str())
            .await
        {
            debug!(chat_id = chat_id.0, error = e.as_str(), "sendChatAction failed");
        }
    }
}

/// Real Telegram Bot API HTTP client using reqwest.
pub struct RealTelegramHttp {
    client: reqwest::Client,
    base_url: String,
}

impl RealTelegramHttp {
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for Telegram");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        }
    }

    async fn parse_body(resp: reqwest::Response) -> Result<serde_json::Value, String> {
        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {}", e.without_url()))?;

        if !body["ok"].as_bool().unwrap_or(false) {
            let desc = body["description"].as_str().unwrap_or("unknown error");
            return Err(format!("Telegram API error ({}): {}", status, desc));
        }
        Ok(body)
    }

    fn message_id(body: &serde_json::Value) -> String {
        body["result"]["message_id"]
            .as_i64()
            .unwrap_or(0)
            .to_string()
    }
}

#[async_trait]
impl TelegramHttpClient for RealTelegramHttp {
    async fn get_me(&self) -> Result<String, String> {
        let url = format!("{}/getMe", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e.without_url()))?;
        let body = Self::parse_body(resp).await?;
        Ok(body["result"]["username"]
            .as_str()
            .unwrap_or("unknown")
            .to_string())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<String, String> {
        let url = format!("{}/sendMessage", self.base_url);
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(mode) = parse_mode {
            payload["parse_mode"] = serde_json::Value::String(mode.to_string());
        }
        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(30))
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e.without_url()))?;

        let body = Self::parse_body(resp).await?;
        Ok(Self::message_id(&body))
    }

    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        data: Bytes,
        caption: Option<&str>,
    ) -> Result<String, String> {
        let url = format!("{}/sendDocument", self.base_url);
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| format!("MIME error: {e}"))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("disable_notification", "true")
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(60))
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e.without_url()))?;

        let body = Self::parse_body(resp).await?;
        Ok(Self::message_id(&body))
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), String> {
        let url = format!("{}/sendChatAction", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(10))
            .json(&serde_json::json!({ "chat_id": chat_id, "action": action }))
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e.without_url()))?;
        Self::parse_body(resp).await.map(|_| ())
    }

    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, String> {
        let url = format!(
            "{}/getUpdates?offset={}&timeout={}&allowed_updates=%5B%22message%22%5D",
            self.base_url, offset, timeout_secs
        );
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e.without_url()))?;

        let body = Self::parse_body(resp).await?;
        Ok(parse_updates(&body))
    }
}

/// Extract message updates from a `getUpdates` response body.
pub fn parse_updates(body: &serde_json::Value) -> Vec<TelegramUpdate> {
    body["result"]
        .as_array()
        .map(|updates| {
            updates
                .iter()
                .filter_map(|u| {
                    let msg = &u["message"];
                    Some(TelegramUpdate {
                        update_id: u["update_id"].as_i64()?,
                        chat_id: msg["chat"]["id"].as_i64().unwrap_or(0),
                        from_id: msg["from"]["id"].as_i64().unwrap_or(0),
                        from_name: msg["from"]["first_name"]
                            .as_str()
                            .unwrap_or("Unknown")
                            .to_string(),
                        text: msg["text"].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Create a Telegram channel with a real HTTP client.
pub fn create_telegram_channel(config: TelegramConfig) -> TelegramChannel {
    let http = RealTelegramHttp::new(&config.api_base, &config.bot_token);
    TelegramChannel::new(config, Box::new(http))
}
