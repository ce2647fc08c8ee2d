//! # Channel System
//!
//! Chat platform plumbing for Briefbot. A [`Channel`] delivers inbound
//! messages; a [`ChatSink`] carries replies back to a chat. The Telegram
//! implementation provides both, and the SMTP mailer lives alongside it as
//! the outbound email transport.

pub mod email;
pub mod telegram;
pub mod types;

pub use email::{EmailConfig, SmtpMailer};
pub use telegram::{TelegramChannel, TelegramConfig};
pub use types::{
    ChannelStatus, ChatAction, InboundMessage, MessageId, Reply, TextFormat, split_html_message,
    split_message,
};

use crate::error::BriefbotError;
use crate::types::ChatId;
use async_trait::async_trait;

/// Core trait for an inbound chat platform connection.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable name of this channel instance.
    fn name(&self) -> &str;

    /// Connect to the channel's platform.
    async fn connect(&mut self) -> Result<(), BriefbotError>;

    /// Disconnect from the channel's platform.
    async fn disconnect(&mut self) -> Result<(), BriefbotError>;

    /// Poll for new incoming messages, in arrival order.
    async fn receive_messages(&self) -> Result<Vec<InboundMessage>, BriefbotError>;

    /// Current connection status.
    fn status(&self) -> ChannelStatus;

    /// Convenience: whether the channel is connected.
    fn is_connected(&self) -> bool {
        self.status() == ChannelStatus::Connected
    }

    /// Pause between polls after a failed poll, in milliseconds.
    fn poll_backoff_ms(&self) -> u64 {
        5000
    }
}

/// Outbound side of a chat: where flows send their replies.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send a reply to a chat. Returns the platform message ID.
    async fn deliver(&self, chat_id: ChatId, reply: Reply) -> Result<MessageId, BriefbotError>;

    /// Show a transient activity indicator. Failures are not interesting to callers.
    async fn show_action(&self, _chat_id: ChatId, _action: ChatAction) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A minimal channel to test default trait methods.
    struct DefaultTestChannel;

    #[async_trait]
    impl Channel for DefaultTestChannel {
        fn name(&self) -> &str {
            "default-test"
        }
        async fn connect(&mut self) -> Result<(), BriefbotError> {
            Ok(())
        }
        async fn disconnect(&mut self) -> Result<(), BriefbotError> {
            Ok(())
        }
        async fn receive_messages(&self) -> Result<Vec<InboundMessage>, BriefbotError> {
            Ok(Vec::new())
        }
        fn status(&self) -> ChannelStatus {
            ChannelStatus::Disconnected
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(ChatId, Reply)>>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn deliver(&self, chat_id: ChatId, reply: Reply) -> Result<MessageId, BriefbotError> {
            self.sent.lock().unwrap().push((chat_id, reply));
            Ok(MessageId::new("1"))
        }
    }

    #[test]
    fn test_default_channel_methods() {
        let ch = DefaultTestChannel;
        assert!(!ch.is_connected());
        assert_eq!(ch.poll_backoff_ms(), 5000);
    }

    #[tokio::test]
    async fn test_default_show_action_is_noop() {
        let sink = RecordingSink::default();
        sink.show_action(ChatId(1), ChatAction::Typing).await;
        assert!(sink.sent.lock().unwrap().is_empty());

        sink.deliver(ChatId(1), Reply::text("hi")).await.unwrap();
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
