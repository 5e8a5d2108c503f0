//! Wire shapes for the channel webhook.
//!
//! The channel posts one activity envelope per event; only the fields the
//! router consumes are modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MembersAddedEvent, MessageEvent};

/// A conversation participant as named by the channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The conversation the activity belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRef {
    pub id: String,
}

/// One inbound channel activity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    /// `message` or `conversationUpdate`.
    #[serde(rename = "type")]
    pub activity_type: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub channel_id: Option<String>,

    pub conversation: ConversationRef,

    pub from: ParticipantRef,

    /// The bot's own identity on this channel.
    #[serde(default)]
    pub recipient: Option<ParticipantRef>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub members_added: Option<Vec<ParticipantRef>>,
}

pub const ACTIVITY_MESSAGE: &str = "message";
pub const ACTIVITY_CONVERSATION_UPDATE: &str = "conversationUpdate";

impl ActivityRequest {
    fn channel_id(&self) -> String {
        self.channel_id.clone().unwrap_or_else(|| "unknown".to_string())
    }

    pub fn to_message_event(&self) -> Option<MessageEvent> {
        if self.activity_type != ACTIVITY_MESSAGE {
            return None;
        }
        Some(MessageEvent {
            conversation_id: self.conversation.id.clone(),
            channel_id: self.channel_id(),
            from_id: self.from.id.clone(),
            message_id: self.id.clone(),
            text: self.text.clone().unwrap_or_default(),
            timestamp: self.timestamp,
        })
    }

    pub fn to_members_added_event(&self) -> Option<MembersAddedEvent> {
        if self.activity_type != ACTIVITY_CONVERSATION_UPDATE {
            return None;
        }
        let members = self.members_added.as_ref()?;
        if members.is_empty() {
            return None;
        }
        Some(MembersAddedEvent {
            conversation_id: self.conversation.id.clone(),
            channel_id: self.channel_id(),
            from_id: self.from.id.clone(),
            recipient_id: self
                .recipient
                .as_ref()
                .map(|r| r.id.clone())
                .unwrap_or_default(),
            member_ids: members.iter().map(|m| m.id.clone()).collect(),
            timestamp: self.timestamp,
        })
    }
}

/// Health check body.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: u16,
}

/// Error body for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
