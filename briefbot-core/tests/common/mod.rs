//! In-memory adapters and a recording chat sink for driving the dispatcher.

#![allow(dead_code)]

use async_trait::async_trait;
use briefbot_core::channels::{ChatAction, ChatSink, InboundMessage, MessageId, Reply};
use briefbot_core::{
    Adapters, BriefbotError, ChatId, Dispatcher, EmailSender, FlowError, Report, ReportRenderer,
    SearchProvider, SearchResult, SessionStore, Summarizer, Summary,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn results(n: usize) -> Vec<SearchResult> {
    (1..=n)
        .map(|i| {
            SearchResult::new(
                format!("Result {i}"),
                format!("Snippet number {i}."),
                format!("https://example.com/{i}"),
            )
        })
        .collect()
}

pub struct MockSearch {
    response: Mutex<Result<Vec<SearchResult>, FlowError>>,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl MockSearch {
    pub fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            response: Mutex::new(Ok(results)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Mutex::new(Err(FlowError::SearchUnavailable {
                message: "connection refused".into(),
            })),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Change what later searches return.
    pub fn respond_with(&self, response: Result<Vec<SearchResult>, FlowError>) {
        *self.response.lock().unwrap() = response;
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<SearchResult>, FlowError> {
        self.calls.lock().unwrap().push((topic.to_string(), limit));
        self.response.lock().unwrap().clone()
    }
}

pub struct MockSummarizer {
    bullets: Option<Vec<String>>,
    delay: Duration,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockSummarizer {
    pub fn returning(bullets: &[&str]) -> Self {
        Self {
            bullets: Some(bullets.iter().map(|b| b.to_string()).collect()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            bullets: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, topic: &str, snippets: &[String]) -> Result<Summary, FlowError> {
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_string(), snippets.to_vec()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.bullets {
            Some(bullets) => Ok(Summary::new(topic, bullets.clone())),
            None => Err(FlowError::SummarizationUnavailable {
                message: "quota exceeded".into(),
            }),
        }
    }
}

pub struct MockRenderer {
    fail: bool,
    pub calls: Mutex<Vec<Summary>>,
}

impl MockRenderer {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn pdf_for(topic: &str) -> Vec<u8> {
        format!("%PDF-1.7 {topic}").into_bytes()
    }
}

#[async_trait]
impl ReportRenderer for MockRenderer {
    async fn render(&self, topic: &str, summary: &Summary) -> Result<Report, FlowError> {
        self.calls.lock().unwrap().push(summary.clone());
        if self.fail {
            return Err(FlowError::RenderFailed {
                message: "no fonts".into(),
            });
        }
        Ok(Report::new(topic, Self::pdf_for(topic)))
    }
}

pub struct MockEmail {
    fail: bool,
    pub sent: Mutex<Vec<(String, String, Report)>>,
}

impl MockEmail {
    pub fn working() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for MockEmail {
    async fn send(&self, recipient: &str, subject: &str, attachment: &Report) -> Result<(), FlowError> {
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            attachment.clone(),
        ));
        if self.fail {
            return Err(FlowError::EmailDeliveryFailed {
                message: "535 authentication failed".into(),
            });
        }
        Ok(())
    }
}

/// Records every reply and chat action in delivery order.
#[derive(Default)]
pub struct RecordingSink {
    pub replies: Mutex<Vec<(ChatId, Reply)>>,
    pub actions: Mutex<Vec<(ChatId, ChatAction)>>,
}

impl RecordingSink {
    pub fn replies_for(&self, chat_id: ChatId) -> Vec<Reply> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn texts_for(&self, chat_id: ChatId) -> Vec<String> {
        self.replies_for(chat_id)
            .iter()
            .filter_map(|r| r.as_text().map(str::to_string))
            .collect()
    }

    pub fn last_text(&self, chat_id: ChatId) -> Option<String> {
        self.texts_for(chat_id).pop()
    }

    pub fn clear(&self) {
        self.replies.lock().unwrap().clear();
        self.actions.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn deliver(&self, chat_id: ChatId, reply: Reply) -> Result<MessageId, BriefbotError> {
        self.replies.lock().unwrap().push((chat_id, reply));
        Ok(MessageId::random())
    }

    async fn show_action(&self, chat_id: ChatId, action: ChatAction) {
        self.actions.lock().unwrap().push((chat_id, action));
    }
}

/// A dispatcher wired to mocks, with handles on each mock.
pub struct Harness {
    pub sessions: Arc<SessionStore>,
    pub sink: Arc<RecordingSink>,
    pub search: Arc<MockSearch>,
    pub summarizer: Arc<MockSummarizer>,
    pub renderer: Arc<MockRenderer>,
    pub email: Arc<MockEmail>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(
        search: MockSearch,
        summarizer: MockSummarizer,
        renderer: MockRenderer,
        email: MockEmail,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let sink = Arc::new(RecordingSink::default());
        let search = Arc::new(search);
        let summarizer = Arc::new(summarizer);
        let renderer = Arc::new(renderer);
        let email = Arc::new(email);

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&sessions),
            sink.clone(),
            Adapters {
                search: search.clone(),
                summarizer: summarizer.clone(),
                renderer: renderer.clone(),
                email: email.clone(),
            },
            3,
        ));

        Self {
            sessions,
            sink,
            search,
            summarizer,
            renderer,
            email,
            dispatcher,
        }
    }

    /// Every adapter succeeds.
    pub fn happy() -> Self {
        Self::new(
            MockSearch::returning(results(3)),
            MockSummarizer::returning(&["Qubits", "Superposition", "Entanglement", "Decoherence"]),
            MockRenderer::working(),
            MockEmail::working(),
        )
    }

    pub async fn send(&self, chat_id: i64, text: &str) -> briefbot_core::PendingAction {
        self.dispatcher
            .handle(&InboundMessage::new(chat_id, text))
            .await
    }
}
