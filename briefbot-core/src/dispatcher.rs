//! Per-chat conversation state machine.
//!
//! A chat is either idle or awaiting an email address for its last report.
//! Commands are honoured in both states; plain text is only meaningful while
//! an address is expected.
//!
//! ```text
//!  IDLE ──research ok──▶ AWAITING_EMAIL
//!   ▲                        │
//!   └── address / decline ◀──┘   (other text re-prompts)
//! ```

use crate::adapters::{EmailSender, ReportRenderer, SearchProvider, Summarizer};
use crate::channels::{ChatSink, InboundMessage, Reply};
use crate::command::{Command, EmailReply};
use crate::digest;
use crate::error::FlowError;
use crate::flows::{EmailFlow, ResearchFlow, ResearchOutcome};
use crate::session::{PendingAction, SessionStore};
use crate::types::ChatId;
use std::sync::Arc;
use tracing::{debug, info};

/// Adapters the flows run against.
pub struct Adapters {
    pub search: Arc<dyn SearchProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub email: Arc<dyn EmailSender>,
}

/// Routes inbound messages to flows and applies session transitions.
pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    sink: Arc<dyn ChatSink>,
    research: ResearchFlow,
    email: EmailFlow,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionStore>,
        sink: Arc<dyn ChatSink>,
        adapters: Adapters,
        result_limit: usize,
    ) -> Self {
        Self {
            sessions,
            sink,
            research: ResearchFlow::new(
                adapters.search,
                adapters.summarizer,
                adapters.renderer,
                result_limit,
            ),
            email: EmailFlow::new(adapters.email),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound message and return the chat's resulting state.
    ///
    /// Must not be called concurrently for the same chat.
    pub async fn handle(&self, msg: &InboundMessage) -> PendingAction {
        let chat_id = msg.chat_id;
        let command = Command::parse(&msg.text);
        debug!(chat_id = %chat_id, kind = command.kind(), "Dispatching message");

        match command {
            Command::Start | Command::Unknown { .. } => {
                self.send(chat_id, digest::GREETING).await;
            }
            Command::Research { topic, inline_pdf } => {
                self.research(chat_id, &topic, inline_pdf).await;
            }
            Command::Text(text) => {
                if self.sessions.pending_action(chat_id) == PendingAction::AwaitingEmail {
                    self.email_reply(chat_id, &text).await;
                } else {
                    self.send(chat_id, digest::IDLE_HELP).await;
                }
            }
        }

        self.sessions.pending_action(chat_id)
    }

    async fn research(&self, chat_id: ChatId, topic: &str, inline_pdf: bool) {
        if topic.is_empty() {
            let command = if inline_pdf { "/researchpdf" } else { "/research" };
            let error = FlowError::InvalidInput {
                reason: digest::usage(command),
            };
            self.send(chat_id, error.user_message()).await;
            return;
        }

        info!(chat_id = %chat_id, topic, inline_pdf, "Starting research");

        match self.research.run(self.sink.as_ref(), chat_id, topic, inline_pdf).await {
            ResearchOutcome::Completed { report, .. } => {
                self.sessions.update(chat_id, |s| s.record_report(report));
            }
            ResearchOutcome::SummaryOnly { summary, .. } => {
                self.sessions
                    .update(chat_id, |s| s.record_topic_without_report(summary.topic));
            }
            // A new run supersedes any earlier email offer.
            ResearchOutcome::Aborted { .. } => {
                if self.sessions.pending_action(chat_id) == PendingAction::AwaitingEmail {
                    self.sessions.update(chat_id, |s| s.clear_pending());
                }
            }
        }
    }

    async fn email_reply(&self, chat_id: ChatId, text: &str) {
        match EmailReply::classify(text) {
            EmailReply::Address(address) => {
                let session = self.sessions.get(chat_id);
                let outcome = self.email.run(self.sink.as_ref(), &session, &address).await;
                debug!(chat_id = %chat_id, outcome = ?outcome, "Email flow finished");
                self.sessions.update(chat_id, |s| s.clear_pending());
            }
            EmailReply::Decline => {
                self.sessions.update(chat_id, |s| s.clear_pending());
                self.send(chat_id, digest::EMAIL_DECLINED).await;
            }
            EmailReply::Unrecognized => {
                self.send(chat_id, digest::EMAIL_REASK).await;
            }
        }
    }

    async fn send(&self, chat_id: ChatId, text: impl Into<String>) {
        crate::flows::reply(self.sink.as_ref(), chat_id, Reply::text(text)).await;
    }
}
