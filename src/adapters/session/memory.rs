//! In-memory session store.
//!
//! Per-worker process-local map; sessions are lost on restart. Used in
//! development and tests, swappable with the Redis store without router
//! changes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// Process-local session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions (test helper).
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Clear all sessions (test helper).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn init(&self) -> Result<(), SessionStoreError> {
        info!("Initialized in-memory session store");
        Ok(())
    }

    async fn set_session(&self, key: &str, session: &Session) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_get_missing_session_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.get_session("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let store = MemorySessionStore::new();
        let mut session = Session::new("c1", "webchat", "u1", "hi", "Welcome!", Utc::now());
        session.turn = 7;
        session.is_flow_completed = true;
        session
            .bot_context
            .insert("FAQ".to_string(), serde_json::json!({"kb": "default"}));

        store.set_session("c1", &session).await.unwrap();
        let loaded = store.get_session("c1").await.unwrap().unwrap();

        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_set_overwrites_previous() {
        let store = MemorySessionStore::new();
        let mut session = Session::new("c1", "webchat", "u1", "hi", "Welcome!", Utc::now());
        store.set_session("c1", &session).await.unwrap();

        session.turn = 2;
        store.set_session("c1", &session).await.unwrap();

        let loaded = store.get_session("c1").await.unwrap().unwrap();
        assert_eq!(loaded.turn, 2);
        assert_eq!(store.session_count().await, 1);
    }
}
