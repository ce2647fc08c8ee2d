//! Core domain types shared by the flows and adapters.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Stable identifier of a single conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl ChatId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single organic result returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }
}

/// A source cited at the bottom of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
}

impl From<&SearchResult> for SourceLink {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
        }
    }
}

/// Bullet-point summary of one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub topic: String,
    pub bullets: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceLink>,
}

impl Summary {
    pub fn new(topic: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            topic: topic.into(),
            bullets,
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceLink>) -> Self {
        self.sources = sources;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }
}

/// A rendered PDF report.
///
/// The payload is reference-counted, so cloning a report out of the session
/// store does not copy the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub topic: String,
    pub filename: String,
    pub bytes: Bytes,
}

impl Report {
    pub const DEFAULT_FILENAME: &'static str = "research_summary.pdf";

    pub fn new(topic: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            filename: Self::DEFAULT_FILENAME.to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_display() {
        assert_eq!(ChatId::new(-100123).to_string(), "-100123");
        assert_eq!(ChatId::from(42), ChatId(42));
    }

    #[test]
    fn test_source_link_from_result() {
        let result = SearchResult::new("Rust", "A language", "https://rust-lang.org");
        let link = SourceLink::from(&result);
        assert_eq!(link.title, "Rust");
        assert_eq!(link.url, "https://rust-lang.org");
    }

    #[test]
    fn test_report_defaults() {
        let report = Report::new("qubits", b"%PDF-1.4".to_vec());
        assert_eq!(report.filename, "research_summary.pdf");
        assert_eq!(report.len(), 8);
        assert!(!report.is_empty());

        let renamed = report.with_filename("qubits.pdf");
        assert_eq!(renamed.filename, "qubits.pdf");
    }

    #[test]
    fn test_report_clone_shares_buffer() {
        let report = Report::new("t", vec![1u8; 1024]);
        let copy = report.clone();
        assert_eq!(report.bytes.as_ptr(), copy.bytes.as_ptr());
    }

    #[test]
    fn test_summary_serialization() {
        let summary = Summary::new("topic", vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&summary).unwrap();
        let restored: Summary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, summary);
    }
}
