//! Inbound events accepted from the channel transport.
//!
//! The router never inspects transport-specific envelope fields beyond
//! what is extracted here.

use chrono::{DateTime, Utc};

/// One inbound user utterance.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub conversation_id: String,
    pub channel_id: String,
    pub from_id: String,
    /// Message id assigned by the channel, if any.
    pub message_id: Option<String>,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Members joined the conversation; triggers session creation and a
/// greeting.
#[derive(Debug, Clone)]
pub struct MembersAddedEvent {
    pub conversation_id: String,
    pub channel_id: String,
    pub from_id: String,
    /// The bot's own channel identity; joining members matching it are not
    /// greeted.
    pub recipient_id: String,
    pub member_ids: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}
