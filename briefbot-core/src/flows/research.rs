//! The research flow: search, summarize, reply, render, offer email.

use super::{OnFailure, reply};
use crate::adapters::{ReportRenderer, SearchProvider, Summarizer};
use crate::channels::{ChatAction, ChatSink, Reply};
use crate::digest;
use crate::error::FlowError;
use crate::types::{ChatId, Report, SearchResult, SourceLink, Summary};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Steps of a research run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchStep {
    Search,
    Summarize,
    SendSummary,
    Render,
    DeliverDocument,
    OfferEmail,
}

impl ResearchStep {
    pub const ORDER: [ResearchStep; 6] = [
        Self::Search,
        Self::Summarize,
        Self::SendSummary,
        Self::Render,
        Self::DeliverDocument,
        Self::OfferEmail,
    ];

    pub fn on_failure(&self) -> OnFailure {
        match self {
            // Nothing worth keeping reached the chat yet.
            Self::Search | Self::Summarize | Self::SendSummary => OnFailure::Abort,
            // The summary is already in the chat; only the PDF-dependent steps go.
            Self::Render | Self::DeliverDocument | Self::OfferEmail => OnFailure::Skip,
        }
    }
}

/// How a research run ended.
#[derive(Debug, Clone)]
pub enum ResearchOutcome {
    /// A step failed before the summary reached the chat.
    Aborted { step: ResearchStep, error: FlowError },
    /// The summary was sent but no report could be rendered.
    SummaryOnly { summary: Summary, error: FlowError },
    /// The summary was sent and the report rendered.
    Completed { summary: Summary, report: Report },
}

/// Values produced by the steps that ran so far.
#[derive(Default)]
struct Progress {
    results: Vec<SearchResult>,
    summary: Option<Summary>,
    report: Option<Report>,
    skipped: Option<FlowError>,
}

/// Runs the research steps against the configured adapters.
pub struct ResearchFlow {
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    renderer: Arc<dyn ReportRenderer>,
    result_limit: usize,
}

impl ResearchFlow {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn Summarizer>,
        renderer: Arc<dyn ReportRenderer>,
        result_limit: usize,
    ) -> Self {
        Self {
            search,
            summarizer,
            renderer,
            result_limit: result_limit.max(1),
        }
    }

    /// Run the flow for a non-empty topic.
    ///
    /// Steps run in [`ResearchStep::ORDER`]. A failed step is reported in the
    /// chat and then handled per [`ResearchStep::on_failure`]; a step whose
    /// input was never produced does nothing. The outcome tells the caller
    /// which session transition applies.
    pub async fn run(
        &self,
        sink: &dyn ChatSink,
        chat_id: ChatId,
        topic: &str,
        inline_pdf: bool,
    ) -> ResearchOutcome {
        let started = Instant::now();
        let mut progress = Progress::default();

        for step in ResearchStep::ORDER {
            let Err(error) = self
                .execute(step, sink, chat_id, topic, inline_pdf, &mut progress)
                .await
            else {
                continue;
            };

            warn!(chat_id = %chat_id, step = ?step, error = %error, "Research step failed");
            reply(sink, chat_id, Reply::text(error.user_message())).await;
            match step.on_failure() {
                OnFailure::Abort => return ResearchOutcome::Aborted { step, error },
                OnFailure::Skip => {
                    progress.skipped.get_or_insert(error);
                }
            }
        }

        let Progress {
            summary,
            report,
            skipped,
            ..
        } = progress;
        let Some(summary) = summary else {
            return ResearchOutcome::Aborted {
                step: ResearchStep::Summarize,
                error: FlowError::SummarizationUnavailable {
                    message: "no summary produced".to_string(),
                },
            };
        };
        let Some(report) = report else {
            return ResearchOutcome::SummaryOnly {
                summary,
                error: skipped.unwrap_or(FlowError::RenderFailed {
                    message: "no report produced".to_string(),
                }),
            };
        };

        info!(
            chat_id = %chat_id,
            bullets = summary.bullets.len(),
            report_bytes = report.len(),
            inline_pdf,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Research flow completed"
        );
        ResearchOutcome::Completed { summary, report }
    }

    async fn execute(
        &self,
        step: ResearchStep,
        sink: &dyn ChatSink,
        chat_id: ChatId,
        topic: &str,
        inline_pdf: bool,
        progress: &mut Progress,
    ) -> Result<(), FlowError> {
        match step {
            ResearchStep::Search => {
                sink.show_action(chat_id, ChatAction::Typing).await;
                progress.results = self.find_results(topic).await?;
            }
            ResearchStep::Summarize => {
                progress.summary = Some(self.summarize_results(topic, &progress.results).await?);
            }
            ResearchStep::SendSummary => {
                if let Some(summary) = &progress.summary {
                    let html = digest::format_summary_html(summary);
                    deliver(sink, chat_id, Reply::html(html)).await?;
                }
            }
            ResearchStep::Render => {
                if let Some(summary) = &progress.summary {
                    if inline_pdf {
                        sink.show_action(chat_id, ChatAction::UploadDocument).await;
                    }
                    progress.report = Some(self.renderer.render(topic, summary).await?);
                }
            }
            ResearchStep::DeliverDocument => {
                if let (true, Some(report)) = (inline_pdf, &progress.report) {
                    let caption = format!("Research summary: {topic}");
                    deliver(sink, chat_id, Reply::document(report.clone()).with_caption(caption))
                        .await?;
                }
            }
            ResearchStep::OfferEmail => {
                if progress.report.is_some() {
                    deliver(sink, chat_id, Reply::text(digest::EMAIL_PROMPT)).await?;
                }
            }
        }
        Ok(())
    }

    async fn find_results(&self, topic: &str) -> Result<Vec<SearchResult>, FlowError> {
        let mut results = self.search.search(topic, self.result_limit).await?;
        results.truncate(self.result_limit);
        if results.is_empty() {
            return Err(FlowError::NoResults {
                topic: topic.to_string(),
            });
        }
        Ok(results)
    }

    async fn summarize_results(
        &self,
        topic: &str,
        results: &[SearchResult],
    ) -> Result<Summary, FlowError> {
        let snippets: Vec<String> = results
            .iter()
            .map(|r| {
                if r.snippet.trim().is_empty() {
                    r.title.clone()
                } else {
                    r.snippet.clone()
                }
            })
            .collect();

        let summary = self.summarizer.summarize(topic, &snippets).await?;
        if summary.is_empty() {
            return Err(FlowError::SummarizationUnavailable {
                message: "summary has no bullets".to_string(),
            });
        }

        let sources = results.iter().map(SourceLink::from).collect();
        Ok(summary.with_sources(sources))
    }
}

async fn deliver(sink: &dyn ChatSink, chat_id: ChatId, message: Reply) -> Result<(), FlowError> {
    if reply(sink, chat_id, message).await {
        Ok(())
    } else {
        Err(FlowError::ReplyUndelivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MessageId;
    use crate::error::BriefbotError;
    use crate::error::ChannelError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Search;

    #[async_trait]
    impl SearchProvider for Search {
        async fn search(&self, topic: &str, limit: usize) -> Result<Vec<SearchResult>, FlowError> {
            Ok((0..limit)
                .map(|i| SearchResult::new(format!("{topic} {i}"), "snippet", format!("https://s/{i}")))
                .collect())
        }
    }

    struct Bullets;

    #[async_trait]
    impl Summarizer for Bullets {
        async fn summarize(&self, topic: &str, _snippets: &[String]) -> Result<Summary, FlowError> {
            Ok(Summary::new(topic, vec!["one".into(), "two".into()]))
        }
    }

    #[derive(Default)]
    struct Renderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReportRenderer for Renderer {
        async fn render(&self, topic: &str, _summary: &Summary) -> Result<Report, FlowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Report::new(topic, b"%PDF-1.4".to_vec()))
        }
    }

    /// Records replies; can refuse text or documents.
    #[derive(Default)]
    struct Sink {
        refuse_text: bool,
        refuse_documents: bool,
        delivered: Mutex<Vec<Reply>>,
    }

    #[async_trait]
    impl ChatSink for Sink {
        async fn deliver(&self, _chat_id: ChatId, reply: Reply) -> Result<MessageId, BriefbotError> {
            let refused = match reply {
                Reply::Text { .. } => self.refuse_text,
                Reply::Document { .. } => self.refuse_documents,
            };
            if refused {
                return Err(ChannelError::SendFailed {
                    name: "test".into(),
                    message: "blocked".into(),
                }
                .into());
            }
            self.delivered.lock().unwrap().push(reply);
            Ok(MessageId::random())
        }
    }

    fn flow(renderer: Arc<Renderer>) -> ResearchFlow {
        ResearchFlow::new(Arc::new(Search), Arc::new(Bullets), renderer, 3)
    }

    #[test]
    fn test_step_order_and_policy() {
        assert_eq!(ResearchStep::ORDER[0], ResearchStep::Search);
        assert_eq!(ResearchStep::ORDER[5], ResearchStep::OfferEmail);
        assert_eq!(ResearchStep::Search.on_failure(), OnFailure::Abort);
        assert_eq!(ResearchStep::Summarize.on_failure(), OnFailure::Abort);
        assert_eq!(ResearchStep::SendSummary.on_failure(), OnFailure::Abort);
        assert_eq!(ResearchStep::Render.on_failure(), OnFailure::Skip);
        assert_eq!(ResearchStep::DeliverDocument.on_failure(), OnFailure::Skip);
    }

    #[tokio::test]
    async fn test_undelivered_summary_aborts_before_render() {
        let renderer = Arc::new(Renderer::default());
        let sink = Sink {
            refuse_text: true,
            ..Default::default()
        };

        let outcome = flow(renderer.clone()).run(&sink, ChatId(1), "rust", true).await;

        assert!(matches!(
            outcome,
            ResearchOutcome::Aborted {
                step: ResearchStep::SendSummary,
                error: FlowError::ReplyUndelivered,
            }
        ));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undelivered_document_still_offers_email() {
        let renderer = Arc::new(Renderer::default());
        let sink = Sink {
            refuse_documents: true,
            ..Default::default()
        };

        let outcome = flow(renderer).run(&sink, ChatId(1), "rust", true).await;

        assert!(matches!(outcome, ResearchOutcome::Completed { .. }));
        let texts: Vec<String> = sink
            .delivered
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.as_text().map(String::from))
            .collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1], FlowError::ReplyUndelivered.user_message());
        assert_eq!(texts[2], digest::EMAIL_PROMPT);
    }

    #[tokio::test]
    async fn test_completed_run_delivers_in_step_order() {
        let sink = Sink::default();
        let outcome = flow(Arc::new(Renderer::default()))
            .run(&sink, ChatId(1), "rust", true)
            .await;

        match outcome {
            ResearchOutcome::Completed { summary, report } => {
                assert_eq!(summary.sources.len(), 3);
                assert_eq!(report.topic, "rust");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 3);
        assert!(delivered[0].as_text().is_some_and(|t| t.contains("one")));
        assert!(delivered[1].is_document());
        assert_eq!(delivered[2].as_text(), Some(digest::EMAIL_PROMPT));
    }
}
