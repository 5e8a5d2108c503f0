//! Channel Transport port - outbound delivery to the user's channel.
//!
//! The transport exposes a single "send one message" primitive; callers
//! that need ordered multi-message delivery await each send before issuing
//! the next.

use async_trait::async_trait;

use crate::domain::OrchestratorResponse;

/// Errors from the channel transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to deliver message to channel: {0}")]
    Send(String),
}

/// Outbound side of the channel boundary.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OrchestratorResponse,
    ) -> Result<(), TransportError>;
}
