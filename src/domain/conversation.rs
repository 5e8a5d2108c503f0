//! Adapter-scoped conversation bookkeeping and the one-shot reply channel.
//!
//! Each bot adapter owns exactly one [`ConversationRegistry`]; backends have
//! independent lifecycles and a generic adapter must never reach into
//! another adapter's state. Operating on an unknown conversation id,
//! starting a conversation that already exists, and emitting after channel
//! completion are all protocol violations that fail loudly and are never
//! retried.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::RwLock;

use super::response::OrchestratorResponse;
use super::session::TurnContext;

/// Protocol violations on the conversation registry or reply channel.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversationError {
    #[error("Can't start new conversation with id={0}. It already exists")]
    AlreadyExists(String),

    #[error("No such conversation: id={0}")]
    NotFound(String),

    #[error("Reply channel for conversation id={0} has already completed")]
    AlreadyCompleted(String),
}

/// One event on a reply channel: a buffered message, or the backend's
/// error signal.
#[derive(Debug, Clone)]
pub enum ReplyEvent {
    Message(OrchestratorResponse),
    Error(String),
}

/// Consumer half of a one-shot reply channel. Emits zero or more events and
/// then closes exactly once, when the producing adapter signals completion.
#[derive(Debug)]
pub struct ReplyStream {
    rx: mpsc::UnboundedReceiver<ReplyEvent>,
}

impl ReplyStream {
    /// Next event, or `None` once the channel has completed.
    pub async fn recv(&mut self) -> Option<ReplyEvent> {
        self.rx.recv().await
    }
}

/// One active conversation between an adapter and a backend, alive only
/// while that adapter is handling the conversation.
#[derive(Debug)]
pub struct BotConversation {
    pub id: String,
    /// Producer half of the current reply channel. `None` once the channel
    /// has completed; replaced wholesale by [`ConversationRegistry::new_reply_channel`].
    reply_tx: Option<mpsc::UnboundedSender<ReplyEvent>>,
    complete: bool,
    low_confidence: bool,
    context: serde_json::Value,
    turn_context: Option<TurnContext>,
}

impl BotConversation {
    fn new(id: String) -> Self {
        Self {
            id,
            reply_tx: None,
            complete: false,
            low_confidence: false,
            context: serde_json::Value::Null,
            turn_context: None,
        }
    }
}

/// Read-only copy of a conversation's backend-declared state, taken by the
/// reply aggregator once the channel completes.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub complete: bool,
    pub low_confidence: bool,
    pub context: serde_json::Value,
    pub turn_context: Option<TurnContext>,
}

/// Owned, adapter-scoped table of active conversations with explicit
/// presence checks on every operation.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    conversations: RwLock<HashMap<String, BotConversation>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new conversation. Fails if the id is already present.
    pub async fn start(&self, id: &str) -> Result<(), ConversationError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(id) {
            return Err(ConversationError::AlreadyExists(id.to_string()));
        }
        conversations.insert(id.to_string(), BotConversation::new(id.to_string()));
        Ok(())
    }

    /// Removes a conversation. Fails if absent.
    pub async fn end(&self, id: &str) -> Result<(), ConversationError> {
        let mut conversations = self.conversations.write().await;
        conversations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.conversations.read().await.contains_key(id)
    }

    /// Replaces the conversation's reply channel with a fresh one and
    /// returns the consumer half. Called before every send.
    pub async fn new_reply_channel(&self, id: &str) -> Result<ReplyStream, ConversationError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        conversation.reply_tx = Some(tx);
        Ok(ReplyStream { rx })
    }

    /// Pushes one or more messages onto the conversation's current reply
    /// channel and marks the channel complete: no further messages are
    /// expected until a fresh channel is produced. Delivering to a missing
    /// conversation, or after completion, fails loudly.
    pub async fn deliver(
        &self,
        id: &str,
        messages: Vec<OrchestratorResponse>,
    ) -> Result<(), ConversationError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))?;
        let tx = conversation
            .reply_tx
            .take()
            .ok_or_else(|| ConversationError::AlreadyCompleted(id.to_string()))?;
        for message in messages {
            if tx.send(ReplyEvent::Message(message)).is_err() {
                tracing::warn!(conversation_id = id, "reply stream consumer dropped");
                break;
            }
        }
        // Dropping the sender closes the channel: the completion signal.
        Ok(())
    }

    /// Emits the backend's error signal and completes the channel, so a
    /// failed backend call never leaves the consumer hanging.
    pub async fn fail(&self, id: &str, reason: String) -> Result<(), ConversationError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))?;
        let tx = conversation
            .reply_tx
            .take()
            .ok_or_else(|| ConversationError::AlreadyCompleted(id.to_string()))?;
        let _ = tx.send(ReplyEvent::Error(reason));
        Ok(())
    }

    pub async fn set_complete(&self, id: &str, value: bool) -> Result<(), ConversationError> {
        self.with_conversation(id, |c| c.complete = value).await
    }

    pub async fn set_low_confidence(&self, id: &str, value: bool) -> Result<(), ConversationError> {
        self.with_conversation(id, |c| c.low_confidence = value)
            .await
    }

    /// Stores the adapter-private context blob the backend persists across
    /// turns (e.g. a dialog-engine session token).
    pub async fn set_context(
        &self,
        id: &str,
        context: serde_json::Value,
    ) -> Result<(), ConversationError> {
        self.with_conversation(id, |c| c.context = context).await
    }

    pub async fn set_turn_context(
        &self,
        id: &str,
        turn_context: TurnContext,
    ) -> Result<(), ConversationError> {
        self.with_conversation(id, |c| c.turn_context = Some(turn_context))
            .await
    }

    /// Copy of the conversation's backend-declared state for session
    /// write-back.
    pub async fn snapshot(&self, id: &str) -> Result<ConversationSnapshot, ConversationError> {
        let conversations = self.conversations.read().await;
        let conversation = conversations
            .get(id)
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))?;
        Ok(ConversationSnapshot {
            complete: conversation.complete,
            low_confidence: conversation.low_confidence,
            context: conversation.context.clone(),
            turn_context: conversation.turn_context.clone(),
        })
    }

    async fn with_conversation<F>(&self, id: &str, f: F) -> Result<(), ConversationError>
    where
        F: FnOnce(&mut BotConversation),
    {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))?;
        f(conversation);
        Ok(())
    }
}
