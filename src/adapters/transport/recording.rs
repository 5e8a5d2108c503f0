//! In-memory channel transport for tests.
//!
//! Records every sent message in order so tests can assert on delivery
//! order and exactly-once semantics. Not for production use.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::OrchestratorResponse;
use crate::ports::{ChannelTransport, TransportError};

/// Recording transport test double.
///
/// # Panics
///
/// Accessor methods panic if the internal lock is poisoned; acceptable for
/// test code.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: RwLock<Vec<(String, OrchestratorResponse)>>,
    fail_sends: RwLock<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in send order.
    pub fn sent(&self) -> Vec<(String, OrchestratorResponse)> {
        self.sent.read().expect("sent lock poisoned").clone()
    }

    /// Display text of every message sent to one conversation, in order.
    pub fn texts_for(&self, conversation_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| id == conversation_id)
            .map(|(_, message)| message.display_text().to_string())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().expect("sent lock poisoned").len()
    }

    pub fn clear(&self) {
        self.sent.write().expect("sent lock poisoned").clear();
    }

    /// Make every subsequent send fail (for error-path tests).
    pub fn fail_sends(&self, value: bool) {
        *self.fail_sends.write().expect("fail lock poisoned") = value;
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OrchestratorResponse,
    ) -> Result<(), TransportError> {
        if *self.fail_sends.read().expect("fail lock poisoned") {
            return Err(TransportError::Send("simulated send failure".to_string()));
        }
        self.sent
            .write()
            .expect("sent lock poisoned")
            .push((conversation_id.to_string(), message.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let transport = RecordingTransport::new();
        transport
            .send("c1", &OrchestratorResponse::text("one"))
            .await
            .unwrap();
        transport
            .send("c1", &OrchestratorResponse::text("two"))
            .await
            .unwrap();
        transport
            .send("c2", &OrchestratorResponse::text("other"))
            .await
            .unwrap();

        assert_eq!(transport.texts_for("c1"), vec!["one", "two"]);
        assert_eq!(transport.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let transport = RecordingTransport::new();
        transport.fail_sends(true);
        let err = transport
            .send("c1", &OrchestratorResponse::text("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("simulated"));
        assert_eq!(transport.sent_count(), 0);
    }
}
