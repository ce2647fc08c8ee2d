//! Message loop: polls a channel and hands each message to its chat's worker.
//!
//! Every chat gets one unbounded queue and one worker task, created on the
//! chat's first message. A worker handles its queue strictly in order, so a
//! chat never has two flows in flight, while workers for different chats run
//! concurrently.
//!
//! Like the entries in [`crate::session::SessionStore`], a chat's queue and
//! worker are kept until shutdown. Both grow with the number of distinct
//! chats seen since the process started.

use crate::channels::{Channel, InboundMessage};
use crate::dispatcher::Dispatcher;
use crate::types::ChatId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Registry of per-chat worker queues.
pub struct ChatWorkers {
    dispatcher: Arc<Dispatcher>,
    queues: HashMap<ChatId, mpsc::UnboundedSender<InboundMessage>>,
    tasks: JoinSet<()>,
}

impl ChatWorkers {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            queues: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Queue a message behind any earlier messages from the same chat.
    pub fn submit(&mut self, msg: InboundMessage) {
        let chat_id = msg.chat_id;
        let msg = match self.queues.get(&chat_id) {
            Some(tx) => match tx.send(msg) {
                Ok(()) => return,
                // Worker is gone (it panicked); start a fresh one.
                Err(mpsc::error::SendError(msg)) => {
                    warn!(chat_id = %chat_id, "Chat worker stopped unexpectedly, restarting");
                    msg
                }
            },
            None => msg,
        };

        let tx = self.spawn_worker(chat_id);
        if tx.send(msg).is_err() {
            warn!(chat_id = %chat_id, "Dropped message for chat with no worker");
        }
    }

    /// Number of chats with a worker.
    pub fn active_chats(&self) -> usize {
        self.queues.len()
    }

    /// Close every queue and wait for the workers to finish what they hold.
    pub async fn shutdown(mut self) {
        self.queues.clear();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Chat worker ended abnormally");
            }
        }
    }

    fn spawn_worker(&mut self, chat_id: ChatId) -> mpsc::UnboundedSender<InboundMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundMessage>();
        let dispatcher = Arc::clone(&self.dispatcher);

        self.tasks.spawn(async move {
            debug!(chat_id = %chat_id, "Chat worker started");
            while let Some(msg) = rx.recv().await {
                let state = dispatcher.handle(&msg).await;
                debug!(chat_id = %chat_id, update_id = msg.update_id, state = ?state, "Message handled");
            }
            debug!(chat_id = %chat_id, "Chat worker stopped");
        });

        self.queues.insert(chat_id, tx.clone());
        tx
    }
}

/// Poll `channel` until `cancel` fires, dispatching every message.
///
/// Poll failures are logged and followed by the channel's backoff pause.
/// On cancellation, queued messages are still handled before returning.
pub async fn run_polling<C>(channel: &C, dispatcher: Arc<Dispatcher>, cancel: CancellationToken)
where
    C: Channel + ?Sized,
{
    let sessions = Arc::clone(dispatcher.sessions());
    let mut workers = ChatWorkers::new(dispatcher);
    let backoff = Duration::from_millis(channel.poll_backoff_ms());
    info!(channel = channel.name(), "Polling for messages");

    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = channel.receive_messages() => batch,
        };

        match batch {
            Ok(messages) => {
                for msg in messages {
                    workers.submit(msg);
                }
            }
            Err(e) => {
                warn!(channel = channel.name(), error = %e, "Polling failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    info!(chats = workers.active_chats(), "Stopping; draining chat queues");
    workers.shutdown().await;
    info!(sessions = sessions.len(), "All chat workers stopped");
}
