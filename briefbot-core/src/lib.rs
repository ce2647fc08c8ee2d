//! # Briefbot Core
//!
//! Core library for the Briefbot research assistant.
//! Provides the per-chat conversation state machine, the research and email
//! flows, the adapter traits they run against, the Telegram channel, the
//! Gemini summarizer, the SMTP mailer, configuration, and fundamental types.

pub mod adapters;
pub mod channels;
pub mod command;
pub mod config;
pub mod digest;
pub mod dispatcher;
pub mod error;
pub mod flows;
pub mod providers;
pub mod runtime;
pub mod session;
pub mod types;

// Re-export commonly used types at the crate root.
pub use adapters::{EmailSender, ReportRenderer, SearchProvider, Summarizer};
pub use channels::{Channel, ChatSink, InboundMessage, Reply};
pub use command::{Command, EmailReply};
pub use config::{BotConfig, LlmConfig, ReportConfig, SearchConfig, load_config};
pub use dispatcher::{Adapters, Dispatcher};
pub use error::{BriefbotError, ChannelError, ConfigError, FlowError, Result};
pub use flows::{EmailOutcome, ResearchOutcome};
pub use runtime::{ChatWorkers, run_polling};
pub use session::{ChatSession, PendingAction, SessionStore};
pub use types::{ChatId, Report, SearchResult, SourceLink, Summary};
