//! Session Store port - key-value persistence for session records.
//!
//! Two adapters exist: a process-local map and a networked cache,
//! swappable without router changes. The contract exposes no
//! compare-and-swap or per-key lock; concurrent turns for one conversation
//! can race on load/modify/save. That gap is documented, accepted
//! best-effort behavior, not something adapters may silently fix.

use async_trait::async_trait;

use crate::domain::Session;

/// Errors from the session persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Failed to serialize session: {0}")]
    Serialization(String),

    #[error("Session store unavailable: {0}")]
    Backend(String),
}

/// Key-value store for one session record per conversation identifier.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// One-time startup hook (connection checks, logging).
    async fn init(&self) -> Result<(), SessionStoreError>;

    async fn set_session(&self, key: &str, session: &Session) -> Result<(), SessionStoreError>;

    /// `None` when no session exists for the key.
    async fn get_session(&self, key: &str) -> Result<Option<Session>, SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SessionStore) {}

    #[test]
    fn test_error_display() {
        let err = SessionStoreError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
