//! Wire types for the assistant stateless-message API, shared by the NLU
//! client and the dialog-tree backend adapter. These shapes never cross
//! into the router; they are mapped to the canonical response union at the
//! adapter boundary.

use serde::Deserialize;

use crate::domain::{Entity, Intent, OrchestratorResponse, ResponseOption};

#[derive(Debug, Default, Deserialize)]
pub struct AssistantResponse {
    #[serde(default)]
    pub output: AssistantOutput,
    #[serde(default)]
    pub context: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantOutput {
    #[serde(default)]
    pub intents: Vec<AssistantIntent>,
    #[serde(default)]
    pub entities: Vec<AssistantEntity>,
    #[serde(default)]
    pub generic: Vec<AssistantGeneric>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantIntent {
    pub intent: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
pub struct AssistantEntity {
    pub entity: String,
    pub value: String,
    #[serde(default)]
    pub location: Option<Vec<usize>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantGeneric {
    pub response_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<AssistantOption>>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantOption {
    pub label: String,
    pub value: AssistantOptionValue,
}

#[derive(Debug, Deserialize)]
pub struct AssistantOptionValue {
    pub input: AssistantOptionInput,
}

#[derive(Debug, Deserialize)]
pub struct AssistantOptionInput {
    pub text: String,
}

impl AssistantIntent {
    pub fn to_domain(&self) -> Intent {
        Intent {
            intent: self.intent.clone(),
            confidence: self.confidence,
        }
    }
}

impl AssistantEntity {
    pub fn to_domain(&self) -> Entity {
        Entity {
            entity: self.entity.clone(),
            value: self.value.clone(),
            location: self.location.clone(),
            confidence: self.confidence,
        }
    }
}

impl AssistantGeneric {
    /// Maps one rendered assistant element into the canonical union. An
    /// optional prefix brands texts and titles with the backend's name.
    pub fn to_response(&self, prefix: Option<&str>) -> OrchestratorResponse {
        let brand = |value: &str| match prefix {
            Some(p) => format!("[{}] {}", p, value),
            None => value.to_string(),
        };
        match self.response_type.as_str() {
            "text" => OrchestratorResponse::Text {
                text: brand(self.text.as_deref().unwrap_or_default()),
            },
            "option" => OrchestratorResponse::Option {
                title: brand(self.title.as_deref().or(self.text.as_deref()).unwrap_or_default()),
                description: self.description.clone(),
                options: self
                    .options
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|option| ResponseOption {
                        label: option.label.clone(),
                        value: option.value.input.text.clone(),
                    })
                    .collect(),
            },
            other => OrchestratorResponse::Text {
                text: brand(&format!("No handler for response of type {}", other)),
            },
        }
    }
}

/// Reads `context.skills["main skill"].user_defined.<key>`, the slot
/// assistants use to pass orchestration hints back out of a dialog.
pub fn user_defined<'v>(context: &'v serde_json::Value, key: &str) -> Option<&'v serde_json::Value> {
    context
        .get("skills")?
        .get("main skill")?
        .get("user_defined")?
        .get(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_mapping() {
        let generic = AssistantGeneric {
            response_type: "text".to_string(),
            text: Some("hello".to_string()),
            title: None,
            description: None,
            options: None,
        };
        assert_eq!(
            generic.to_response(None),
            OrchestratorResponse::text("hello")
        );
        assert_eq!(
            generic.to_response(Some("Desk")),
            OrchestratorResponse::text("[Desk] hello")
        );
    }

    #[test]
    fn test_option_mapping_flattens_option_values() {
        let json = serde_json::json!({
            "response_type": "option",
            "title": "Pick",
            "options": [
                {"label": "Reset password", "value": {"input": {"text": "reset"}}}
            ]
        });
        let generic: AssistantGeneric = serde_json::from_value(json).unwrap();
        match generic.to_response(None) {
            OrchestratorResponse::Option { title, options, .. } => {
                assert_eq!(title, "Pick");
                assert_eq!(options[0].label, "Reset password");
                assert_eq!(options[0].value, "reset");
            }
            other => panic!("expected option, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let generic = AssistantGeneric {
            response_type: "image".to_string(),
            text: None,
            title: None,
            description: None,
            options: None,
        };
        match generic.to_response(None) {
            OrchestratorResponse::Text { text } => assert!(text.contains("image")),
            other => panic!("expected text fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_user_defined_lookup() {
        let context = serde_json::json!({
            "skills": {"main skill": {"user_defined": {"skill_transfer": "FAQ"}}}
        });
        assert_eq!(
            user_defined(&context, "skill_transfer").and_then(|v| v.as_str()),
            Some("FAQ")
        );
        assert!(user_defined(&context, "missing").is_none());
    }
}
