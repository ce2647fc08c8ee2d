//! Narrow interfaces to the external collaborators used by the flows.
//!
//! Each adapter isolates one failure mode: implementations map every
//! transport, HTTP or parse failure (including timeouts) into the matching
//! [`FlowError`] variant. Adapters make exactly one attempt per call.

use crate::error::FlowError;
use crate::types::{Report, SearchResult, Summary};
use async_trait::async_trait;

/// Web search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `limit` results for `topic`.
    ///
    /// Fails with [`FlowError::SearchUnavailable`]. An empty result list is
    /// a valid return value; the research flow decides what it means.
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<SearchResult>, FlowError>;
}

/// Hosted language model producing bullet-point summaries.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Fails with [`FlowError::SummarizationUnavailable`].
    async fn summarize(&self, topic: &str, snippets: &[String]) -> Result<Summary, FlowError>;
}

/// PDF rendering backend.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Fails with [`FlowError::RenderFailed`].
    async fn render(&self, topic: &str, summary: &Summary) -> Result<Report, FlowError>;
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Fails with [`FlowError::EmailDeliveryFailed`].
    async fn send(&self, recipient: &str, subject: &str, attachment: &Report)
    -> Result<(), FlowError>;
}
