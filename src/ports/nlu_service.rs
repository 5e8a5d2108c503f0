//! NLU Service port - the primary intent classification backend.

use async_trait::async_trait;

use crate::domain::{NluResult, Session};

/// Errors from the NLU backend. Any failure abandons the current turn.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    #[error("NLU request failed: {0}")]
    Backend(String),

    #[error("NLU response could not be interpreted: {0}")]
    Malformed(String),
}

/// Primary intent/entity classifier consulted when a session needs routing.
#[async_trait]
pub trait NluService: Send + Sync {
    /// Classifies one utterance. May mutate `session.bot_context["NLU"]`,
    /// a capability reserved for the NLU backend's own state.
    async fn send_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<NluResult, NluError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn NluService) {}
}
