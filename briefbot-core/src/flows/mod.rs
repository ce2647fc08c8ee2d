//! Research and email flows.
//!
//! Each flow is an explicit, ordered list of steps. Every step declares the
//! error it can raise and what happens to the rest of the flow when it does:
//! `Abort` stops the flow and the chat gets the error's reply, while `Skip`
//! drops the steps that depend on it and keeps what was already delivered.

pub mod email;
pub mod research;

pub use email::{EmailFlow, EmailOutcome};
pub use research::{ResearchFlow, ResearchOutcome, ResearchStep};

use crate::channels::{ChatSink, Reply};
use crate::types::ChatId;
use tracing::warn;

/// What a flow does after one of its steps fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Stop the flow; nothing after the failed step runs.
    Abort,
    /// Skip the dependent steps; earlier deliveries stand.
    Skip,
}

/// Deliver a reply, logging instead of failing when the chat is unreachable.
pub(crate) async fn reply(sink: &dyn ChatSink, chat_id: ChatId, reply: Reply) -> bool {
    match sink.deliver(chat_id, reply).await {
        Ok(_) => true,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "Failed to deliver reply");
            false
        }
    }
}
