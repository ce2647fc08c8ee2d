//! The email flow: send the chat's last report to an address.

use super::reply;
use crate::adapters::EmailSender;
use crate::channels::{ChatSink, Reply};
use crate::digest;
use crate::error::FlowError;
use crate::session::ChatSession;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Sent,
    Failed(FlowError),
}

pub struct EmailFlow {
    sender: Arc<dyn EmailSender>,
}

impl EmailFlow {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Email `session.last_document` to `recipient` and report the result in chat.
    ///
    /// The caller returns the chat to idle whatever the outcome.
    pub async fn run(
        &self,
        sink: &dyn ChatSink,
        session: &ChatSession,
        recipient: &str,
    ) -> EmailOutcome {
        let chat_id = session.chat_id;
        let Some(report) = session.last_document.as_ref() else {
            reply(sink, chat_id, Reply::text(FlowError::NoDocument.user_message())).await;
            return EmailOutcome::Failed(FlowError::NoDocument);
        };

        let topic = session.last_topic.as_deref().unwrap_or(report.topic.as_str());
        let subject = digest::email_subject(Some(topic));

        match self.sender.send(recipient, &subject, report).await {
            Ok(()) => {
                info!(chat_id = %chat_id, "Report emailed");
                reply(sink, chat_id, Reply::text(digest::email_confirmation(topic, recipient))).await;
                EmailOutcome::Sent
            }
            Err(error) => {
                warn!(chat_id = %chat_id, error = %error, "Report email failed");
                reply(sink, chat_id, Reply::text(error.user_message())).await;
                EmailOutcome::Failed(error)
            }
        }
    }
}
