//! Bot Adapter port - capability contract for secondary conversational
//! backends.
//!
//! Every backend is injected into the router as an instance of this trait
//! plus a static name and the list of skills it serves. Each concrete
//! adapter additionally updates its conversation's `complete` and
//! `low_confidence` flags and private context blob as a side effect of
//! `start_chat`/`on_message` - the only channel through which
//! backend-specific completion and confidence semantics reach the router.
//!
//! Adapters also expose a `format_response` mapping from their native
//! payload type into `Vec<OrchestratorResponse>`; the payload shape differs
//! per backend, so that mapping is an inherent method on each adapter
//! rather than part of this object-safe trait.

use async_trait::async_trait;

use crate::domain::{ConversationError, ConversationRegistry, ReplyStream, Session};

/// Errors surfaced by bot adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Protocol violation on the adapter's conversation registry.
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// The backend call itself failed.
    #[error("Backend request failed: {0}")]
    Backend(String),
}

/// Polymorphic capability required of every secondary backend.
#[async_trait]
pub trait BotAdapter: Send + Sync {
    /// Static backend name, used as the session's `active_bot_name` and as
    /// the key into its `bot_context` map.
    fn name(&self) -> &str;

    /// Skill tags this backend serves; NLU-declared transfers are resolved
    /// by name-in-skills lookup.
    fn skills(&self) -> &[String];

    /// The adapter-scoped conversation registry.
    fn registry(&self) -> &ConversationRegistry;

    /// Registers the conversation and triggers the backend's first turn.
    /// The returned channel must eventually complete.
    async fn start_chat(&self, id: &str, session: &mut Session) -> Result<ReplyStream, BotError>;

    /// Forwards one utterance to an already-started conversation. The
    /// returned channel must eventually complete, even on backend error:
    /// the error surfaces through the channel's error signal, never a
    /// silent hang.
    async fn on_message(&self, text: &str, session: &mut Session)
        -> Result<ReplyStream, BotError>;

    /// Releases backend-side and registry-side state.
    async fn end_chat(&self, id: &str) -> Result<(), BotError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn BotAdapter) {}
}
