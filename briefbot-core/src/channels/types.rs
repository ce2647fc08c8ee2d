//! Channel types and message protocol.

use crate::digest;
use crate::types::{ChatId, Report};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a message sent through a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received from a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub update_id: i64,
    pub chat_id: ChatId,
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            update_id: 0,
            chat_id: chat_id.into(),
            sender_id: 0,
            sender_name: None,
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    pub fn with_update_id(mut self, update_id: i64) -> Self {
        self.update_id = update_id;
        self
    }

    pub fn with_sender(mut self, id: i64, name: impl Into<String>) -> Self {
        self.sender_id = id;
        self.sender_name = Some(name.into());
        self
    }
}

/// How reply text should be interpreted by the chat platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Telegram's HTML subset (`<b>`, `<i>`, `<a href>`).
    Html,
}

/// Something the bot sends back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text { text: String, format: TextFormat },
    Document { report: Report, caption: Option<String> },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            format: TextFormat::Plain,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            format: TextFormat::Html,
        }
    }

    pub fn document(report: Report) -> Self {
        Self::Document {
            report,
            caption: None,
        }
    }

    pub fn with_caption(self, caption: impl Into<String>) -> Self {
        match self {
            Self::Document { report, .. } => Self::Document {
                report,
                caption: Some(caption.into()),
            },
            other => other,
        }
    }

    /// Extract text content, if present.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Document { .. } => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document { .. })
    }
}

/// Transient status indicator shown while the bot works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatAction {
    Typing,
    UploadDocument,
}

impl ChatAction {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::UploadDocument => "upload_document",
        }
    }
}

/// Connection status of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Not yet connected.
    Disconnected,
    /// Connected and ready.
    Connected,
    /// Permanently failed.
    Failed,
}

/// Split text into chunks of at most `max_len` characters, preferring line breaks.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    split_lines(text, max_len, |line| {
        // A single line longer than the limit is hard-split on char boundaries.
        let chars: Vec<char> = line.chars().collect();
        chars.chunks(max_len).map(|piece| piece.iter().collect()).collect()
    })
}

/// Split Telegram-HTML text into chunks of at most `max_len` characters.
///
/// Lines are kept whole where they fit. A longer line loses its markup and is
/// re-escaped piece by piece, so no chunk ends inside a tag or an entity.
pub fn split_html_message(text: &str, max_len: usize) -> Vec<String> {
    split_lines(text, max_len, |line| {
        let plain = digest::unescape_html(&strip_tags(line));
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;
        let mut buf = [0u8; 4];
        for c in plain.chars() {
            let escaped = digest::escape_html(c.encode_utf8(&mut buf));
            let len = escaped.chars().count();
            if current_len + len > max_len && !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(&escaped);
            current_len += len;
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    })
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn split_lines(
    text: &str,
    max_len: usize,
    hard_split: impl Fn(&str) -> Vec<String>,
) -> Vec<String> {
    if max_len == 0 || text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_len {
            chunks.extend(hard_split(line));
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
