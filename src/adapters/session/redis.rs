//! Redis-backed session store for multi-worker deployments.
//!
//! Sessions are stored as JSON strings keyed by conversation id. The store
//! contract exposes no compare-and-swap; concurrent turns on one
//! conversation can race, which is accepted best-effort behavior.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::config::SessionConfig;
use crate::domain::Session;
use crate::ports::{SessionStore, SessionStoreError};

/// Networked session store shared across worker processes.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connect using the configured Redis URL.
    pub async fn connect(config: &SessionConfig) -> Result<Self, SessionStoreError> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| SessionStoreError::Backend("redis url not configured".to_string()))?;
        let client = redis::Client::open(url)
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn init(&self) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        info!("Initialized Redis session store");
        Ok(())
    }

    async fn set_session(&self, key: &str, session: &Session) -> Result<(), SessionStoreError> {
        let payload = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, payload)
            .await
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        match payload {
            Some(json) => {
                let session = serde_json::from_str(&json)
                    .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}
