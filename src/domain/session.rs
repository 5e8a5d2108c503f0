//! Per-conversation session record and its turn-context sub-record.
//!
//! Pure data. Exactly one session exists per conversation identifier; it is
//! created on the first inbound message (or an explicit member-added event)
//! and read-modify-written once per turn by the orchestrator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::response::OrchestratorResponse;

/// Channel-level identity of the conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Raw inbound utterance for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInput {
    /// Input modality; currently always `text`.
    pub kind: String,
    pub text: String,
}

/// Output text fragments accumulated over the current turn, in
/// presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    pub text: Vec<String>,
}

/// One classified intent with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    pub confidence: f64,
}

/// One detected entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Dialog-flow position reported by flow-capable backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInformation {
    pub id: String,
    pub display_name: String,
    pub state: String,
}

/// Mutable scratch record for the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    /// Unique identifier for this turn (message id or generated).
    pub id: String,
    /// When the inbound message was sent, UTC.
    pub timestamp: DateTime<Utc>,
    /// Name of the skill that produced the detected intents, if any.
    pub skill_name: String,
    pub input: TurnInput,
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    pub output: TurnOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_information: Option<FlowInformation>,
}

impl TurnContext {
    pub fn new(input_text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            skill_name: String::new(),
            input: TurnInput {
                kind: "text".to_string(),
                text: input_text.into(),
            },
            intents: Vec::new(),
            entities: Vec::new(),
            output: TurnOutput::default(),
            flow_information: None,
        }
    }
}

/// Per-conversation session record, keyed by conversation identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub conversation_id: String,
    pub channel_id: String,
    pub user_profile: UserProfile,

    /// Monotonically increasing counter, incremented once per processed
    /// inbound message.
    pub turn: u64,

    pub turn_context: TurnContext,

    /// True when the active backend declared its dialog finished; the next
    /// turn is then eligible for re-routing through NLU.
    pub is_flow_completed: bool,

    /// True when the active backend's confidence fell below its threshold;
    /// the next turn re-routes through NLU even mid-flow.
    pub is_low_confidence: bool,

    /// Name of the backend currently owning the conversation, or empty.
    pub active_bot_name: String,

    /// Opaque per-backend context blobs persisted across turns, keyed by
    /// backend name. The `NLU` key is reserved for the NLU service.
    #[serde(default)]
    pub bot_context: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Creates a fresh session at turn zero with a single greeting already
    /// recorded as output.
    pub fn new(
        conversation_id: impl Into<String>,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        input_text: impl Into<String>,
        greeting: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut turn_context = TurnContext::new(input_text, timestamp);
        turn_context.output.text.push(greeting.into());
        Self {
            conversation_id: conversation_id.into(),
            channel_id: channel_id.into(),
            user_profile: UserProfile {
                id: user_id.into(),
                full_name: None,
            },
            turn: 0,
            turn_context,
            is_flow_completed: false,
            is_low_confidence: false,
            active_bot_name: String::new(),
            bot_context: HashMap::new(),
        }
    }

    /// Resets the turn context for a new inbound message and bumps the turn
    /// counter. Intents and entities from the previous turn are cleared.
    pub fn begin_turn(
        &mut self,
        message_id: Option<String>,
        input_text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) {
        self.turn += 1;
        self.turn_context.id = message_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.turn_context.timestamp = timestamp;
        self.turn_context.input.text = input_text.into();
        self.turn_context.intents.clear();
        self.turn_context.entities.clear();
        self.turn_context.output.text.clear();
    }

    /// Folds message text (or prompt titles) into the accumulated turn
    /// output, preserving buffer order.
    pub fn fold_output(&mut self, messages: &[OrchestratorResponse]) {
        for message in messages {
            self.turn_context
                .output
                .text
                .push(message.display_text().to_string());
        }
    }

    /// Whether an active backend currently owns this conversation.
    pub fn is_bound(&self) -> bool {
        !self.active_bot_name.is_empty()
    }
}
