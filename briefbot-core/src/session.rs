//! Per-chat session state.
//!
//! The store is a process-wide map from [`ChatId`] to [`ChatSession`]. Entries
//! are created on first access and live for the lifetime of the process.
//! Callers are expected to serialize work per chat (see
//! [`crate::runtime::ChatWorkers`]); the map lock itself is only held for the
//! duration of a lookup or a synchronous mutation, never across an `.await`.

use crate::types::{ChatId, Report};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// What the bot is waiting for next in a chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingAction {
    /// Idle: free text gets the help reply.
    #[default]
    None,
    /// A report was produced; the next free text is an email address or a decline.
    AwaitingEmail,
}

/// State kept for a single chat.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub chat_id: ChatId,
    pub pending_action: PendingAction,
    pub last_topic: Option<String>,
    pub last_document: Option<Report>,
}

impl ChatSession {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            pending_action: PendingAction::None,
            last_topic: None,
            last_document: None,
        }
    }

    pub fn is_awaiting_email(&self) -> bool {
        self.pending_action == PendingAction::AwaitingEmail
    }

    /// Record a research run that produced a report and start waiting for an address.
    pub fn record_report(&mut self, report: Report) {
        self.last_topic = Some(report.topic.clone());
        self.last_document = Some(report);
        self.pending_action = PendingAction::AwaitingEmail;
    }

    /// Record a research run that ended without a report.
    ///
    /// Any older document is dropped so `last_topic` and `last_document`
    /// never describe different runs.
    pub fn record_topic_without_report(&mut self, topic: impl Into<String>) {
        self.last_topic = Some(topic.into());
        self.last_document = None;
        self.pending_action = PendingAction::None;
    }

    pub fn clear_pending(&mut self) {
        self.pending_action = PendingAction::None;
    }
}

/// Process-wide session map keyed by chat.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, ChatSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChatId, ChatSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of a chat's session, creating a default entry if absent.
    pub fn get(&self, chat_id: ChatId) -> ChatSession {
        self.lock()
            .entry(chat_id)
            .or_insert_with(|| ChatSession::new(chat_id))
            .clone()
    }

    /// Apply an in-place change to a chat's session, creating it if absent.
    pub fn update<R>(&self, chat_id: ChatId, mutator: impl FnOnce(&mut ChatSession) -> R) -> R {
        let mut sessions = self.lock();
        let session = sessions
            .entry(chat_id)
            .or_insert_with(|| ChatSession::new(chat_id));
        mutator(session)
    }

    pub fn pending_action(&self, chat_id: ChatId) -> PendingAction {
        self.lock()
            .get(&chat_id)
            .map(|s| s.pending_action)
            .unwrap_or_default()
    }

    /// Number of chats seen since process start.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_creates_default_session() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let session = store.get(ChatId(1));
        assert_eq!(session.chat_id, ChatId(1));
        assert_eq!(session.pending_action, PendingAction::None);
        assert!(session.last_topic.is_none());
        assert!(session.last_document.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_mutates_in_place() {
        let store = SessionStore::new();
        store.update(ChatId(7), |s| {
            s.record_report(Report::new("rust", b"%PDF".to_vec()));
        });

        let session = store.get(ChatId(7));
        assert!(session.is_awaiting_email());
        assert_eq!(session.last_topic.as_deref(), Some("rust"));
        assert_eq!(session.last_document.map(|r| r.len()), Some(4));
    }

    #[test]
    fn test_update_returns_mutator_result() {
        let store = SessionStore::new();
        let was_awaiting = store.update(ChatId(3), |s| {
            let prev = s.is_awaiting_email();
            s.clear_pending();
            prev
        });
        assert!(!was_awaiting);
    }

    #[test]
    fn test_record_topic_without_report_drops_stale_document() {
        let mut session = ChatSession::new(ChatId(9));
        session.record_report(Report::new("old topic", b"old".to_vec()));
        session.record_topic_without_report("new topic");

        assert_eq!(session.last_topic.as_deref(), Some("new topic"));
        assert!(session.last_document.is_none());
        assert_eq!(session.pending_action, PendingAction::None);
    }

    #[test]
    fn test_sessions_are_isolated_per_chat() {
        let store = SessionStore::new();
        store.update(ChatId(1), |s| {
            s.record_report(Report::new("a", b"a".to_vec()))
        });
        assert_eq!(store.pending_action(ChatId(1)), PendingAction::AwaitingEmail);
        assert_eq!(store.pending_action(ChatId(2)), PendingAction::None);
        assert!(store.get(ChatId(2)).last_document.is_none());
    }

    #[test]
    fn test_pending_action_does_not_create_entry() {
        let store = SessionStore::new();
        assert_eq!(store.pending_action(ChatId(5)), PendingAction::None);
        assert!(store.is_empty());
    }
}
