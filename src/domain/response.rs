//! Canonical outbound message shape.
//!
//! Every backend-specific payload must be translated into
//! [`OrchestratorResponse`] before leaving the bot adapter boundary; the
//! router and the channel transport never see backend-native shapes.

use serde::{Deserialize, Serialize};

/// One label/value pair for a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub label: String,
    pub value: String,
}

/// Canonical outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorResponse {
    /// Plain text reply.
    Text { text: String },

    /// Choice prompt with clickable options.
    Option {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        options: Vec<ResponseOption>,
    },
}

impl OrchestratorResponse {
    /// Shorthand for a plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text fragment this message contributes to the session's
    /// accumulated turn output: message text, or the title for prompts.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Option { title, .. } => title,
        }
    }

    /// True for a text message with an empty body.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text { text } if text.is_empty())
    }
}
