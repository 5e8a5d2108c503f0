//! Conversation Logger port - append-only analytics sink for turn data.
//!
//! The sink is fire-and-forget from the router's perspective: a push
//! failure is logged and swallowed, never rolling back or delaying a turn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Entity, Intent, Session};

/// Errors from the analytics sink.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Failed to push conversation data: {0}")]
    Push(String),

    #[error("Analytics sink unavailable: {0}")]
    Backend(String),
}

/// Outcome reported by the sink for one pushed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResult {
    pub operation: String,
    pub row_count: u64,
    pub ok: bool,
}

/// Conversation-level identifiers and counters for one turn record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecordContext {
    pub conversation_id: String,
    /// `<active bot>/<skill>` as routed this turn.
    pub skill_name: String,
    pub user_id: String,
    pub input_type: String,
    pub dialog_turn_counter: u64,
    #[serde(default)]
    pub response_context: serde_json::Value,
}

/// Classified input and accumulated output for one turn record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecordData {
    pub input: serde_json::Value,
    pub intents: Vec<Intent>,
    pub entities: Vec<Entity>,
    pub output: serde_json::Value,
    pub context: TurnRecordContext,
}

/// Fixed projection of a session pushed to the analytics sink after each
/// turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub log_id: String,
    pub data: TurnRecordData,
}

impl TurnRecord {
    pub const EVENT_REQUEST_RESPONSE: &'static str = "REQUEST_RESPONSE";

    /// Projects a session's current turn into the analytics record shape.
    pub fn from_session(session: &Session) -> Self {
        let turn_context = &session.turn_context;
        Self {
            event: Self::EVENT_REQUEST_RESPONSE.to_string(),
            timestamp: turn_context.timestamp,
            log_id: turn_context.id.clone(),
            data: TurnRecordData {
                input: serde_json::json!({ "text": turn_context.input.text }),
                intents: turn_context.intents.clone(),
                entities: turn_context.entities.clone(),
                output: serde_json::json!({ "text": turn_context.output.text }),
                context: TurnRecordContext {
                    conversation_id: session.conversation_id.clone(),
                    skill_name: format!(
                        "{}/{}",
                        session.active_bot_name, turn_context.skill_name
                    ),
                    user_id: session.user_profile.id.clone(),
                    input_type: turn_context.input.kind.clone(),
                    dialog_turn_counter: session.turn,
                    response_context: serde_json::to_value(&session.bot_context)
                        .unwrap_or(serde_json::Value::Null),
                },
            },
        }
    }
}

/// Append-only sink for turn records, swappable between an HTTP endpoint
/// and a relational store.
#[async_trait]
pub trait ConversationLogger: Send + Sync {
    /// One-time startup hook (connection checks, logging).
    async fn init(&self) -> Result<(), LoggerError>;

    async fn push(&self, record: TurnRecord) -> Result<LogResult, LoggerError>;
}
