//! Error types for the Briefbot core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the research/email flows, chat channels and configuration.

/// Top-level error type for the Briefbot core library.
#[derive(Debug, thiserror::Error)]
pub enum BriefbotError {
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised while running a research or email flow.
///
/// Every variant is caught at the flow boundary that produced it and turned
/// into a chat reply via [`FlowError::user_message`]; none of them stops the
/// message loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Search provider unavailable: {message}")]
    SearchUnavailable { message: String },

    #[error("No search results for '{topic}'")]
    NoResults { topic: String },

    #[error("Summarization provider unavailable: {message}")]
    SummarizationUnavailable { message: String },

    #[error("Report rendering failed: {message}")]
    RenderFailed { message: String },

    #[error("Email delivery failed: {message}")]
    EmailDeliveryFailed { message: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("No report available for this chat")]
    NoDocument,

    #[error("Reply could not be delivered to the chat")]
    ReplyUndelivered,
}

impl FlowError {
    /// Plain-language text shown to the chat user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::SearchUnavailable { .. } => {
                "Sorry, the search service is unavailable right now. Please try again later."
                    .to_string()
            }
            Self::NoResults { topic } => {
                format!("Sorry, I couldn't find any results for \"{topic}\". Try a different topic.")
            }
            Self::SummarizationUnavailable { .. } => {
                "Sorry, I found results but couldn't summarize them right now. Please try again later."
                    .to_string()
            }
            Self::RenderFailed { .. } => {
                "I couldn't generate a PDF for this summary, so there is nothing to email this time."
                    .to_string()
            }
            Self::EmailDeliveryFailed { .. } => {
                "Sorry, I couldn't send the email. Please check the address or try again later."
                    .to_string()
            }
            Self::InvalidInput { reason } => reason.clone(),
            Self::NoDocument => {
                "There is no report to send yet. Run /research <topic> first.".to_string()
            }
            Self::ReplyUndelivered => {
                "Sorry, part of my answer could not be delivered. Please try again.".to_string()
            }
        }
    }
}

/// Errors from chat channel interactions.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed for channel '{name}'")]
    AuthFailed { name: String },

    #[error("Connection to channel '{name}' failed: {message}")]
    ConnectionFailed { name: String, message: String },

    #[error("Sending through channel '{name}' failed: {message}")]
    SendFailed { name: String, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `BriefbotError`.
pub type Result<T> = std::result::Result<T, BriefbotError>;
