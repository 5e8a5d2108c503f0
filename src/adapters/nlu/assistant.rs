//! HTTP assistant client for the primary NLU service.
//!
//! Calls the assistant's stateless message endpoint, stashing the returned
//! dialog context in `session.bot_context["NLU"]` so classification state
//! survives across turns without server-side sessions.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use tracing::debug;

use crate::config::NluConfig;
use crate::domain::{NluClass, NluResult, Session};
use crate::ports::{NluError, NluService};

use super::wire::{user_defined, AssistantResponse};

/// Key under which the NLU backend keeps its own context blob.
pub const NLU_CONTEXT_KEY: &str = "NLU";

const DEFAULT_TOP_CLASS: &str = "DEFAULT";

/// Assistant-backed NLU service.
pub struct AssistantNlu {
    client: reqwest::Client,
    service_url: String,
    assistant_id: String,
    version: String,
    user_id: Option<String>,
    api_key: Secret<String>,
}

impl AssistantNlu {
    pub fn new(config: &NluConfig) -> Result<Self, NluError> {
        let service_url = config
            .service_url
            .clone()
            .ok_or_else(|| NluError::Backend("service url not configured".to_string()))?;
        let assistant_id = config
            .assistant_id
            .clone()
            .ok_or_else(|| NluError::Backend("assistant id not configured".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| NluError::Backend("api key not configured".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            service_url,
            assistant_id,
            version: config.version.clone(),
            user_id: config.user_id.clone(),
            api_key,
        })
    }

    fn message_url(&self) -> String {
        format!(
            "{}/v2/assistants/{}/message/stateless?version={}",
            self.service_url.trim_end_matches('/'),
            self.assistant_id,
            self.version
        )
    }
}

#[async_trait]
impl NluService for AssistantNlu {
    async fn send_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<NluResult, NluError> {
        let context = session
            .bot_context
            .get(NLU_CONTEXT_KEY)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let body = serde_json::json!({
            "input": { "message_type": "text", "text": text },
            "user_id": self.user_id,
            "context": context,
        });

        let response = self
            .client
            .post(self.message_url())
            .basic_auth("apikey", Some(self.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| NluError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NluError::Backend(format!(
                "assistant returned status {}",
                response.status()
            )));
        }
        let parsed: AssistantResponse = response
            .json()
            .await
            .map_err(|e| NluError::Malformed(e.to_string()))?;
        debug!(intents = parsed.output.intents.len(), "NLU classification");

        session
            .bot_context
            .insert(NLU_CONTEXT_KEY.to_string(), parsed.context.clone());

        Ok(classification(text, &parsed))
    }
}

/// Maps an assistant response into the classification result. The skill
/// transfer always resolves: an explicit user-defined transfer wins, then
/// the top intent's name, then the `DEFAULT` skill, so an unclassified
/// utterance still routes to whichever backend serves `DEFAULT`.
fn classification(text: &str, parsed: &AssistantResponse) -> NluResult {
    let top_intent = parsed.output.intents.first();
    let skill_transfer = user_defined(&parsed.context, "skill_transfer")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| top_intent.map(|intent| intent.intent.clone()))
        .unwrap_or_else(|| DEFAULT_TOP_CLASS.to_string());

    NluResult {
        text: text.to_string(),
        skill_transfer: Some(skill_transfer),
        top_class: top_intent
            .map(|intent| intent.intent.clone())
            .unwrap_or_else(|| DEFAULT_TOP_CLASS.to_string()),
        classes: parsed
            .output
            .intents
            .iter()
            .map(|intent| NluClass {
                class_name: intent.intent.clone(),
                confidence: intent.confidence,
            })
            .collect(),
        entities: parsed
            .output
            .entities
            .iter()
            .map(|entity| entity.to_domain())
            .collect(),
        response: parsed
            .output
            .generic
            .iter()
            .map(|generic| generic.to_response(None))
            .collect(),
    }
}

impl std::fmt::Debug for AssistantNlu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantNlu")
            .field("service_url", &self.service_url)
            .field("assistant_id", &self.assistant_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(json: serde_json::Value) -> AssistantResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_unclassified_utterance_falls_back_to_default_skill() {
        let response = parsed(serde_json::json!({
            "output": {"intents": []},
            "context": {}
        }));
        let result = classification("gibberish", &response);
        assert_eq!(result.skill_transfer.as_deref(), Some("DEFAULT"));
        assert_eq!(result.top_class, "DEFAULT");
    }

    #[test]
    fn test_top_intent_name_used_when_no_transfer_declared() {
        let response = parsed(serde_json::json!({
            "output": {"intents": [
                {"intent": "FAQ", "confidence": 0.91},
                {"intent": "TICKETS", "confidence": 0.4}
            ]},
            "context": {}
        }));
        let result = classification("opening hours?", &response);
        assert_eq!(result.skill_transfer.as_deref(), Some("FAQ"));
        assert_eq!(result.top_class, "FAQ");
        assert_eq!(result.classes.len(), 2);
    }

    #[test]
    fn test_user_defined_transfer_wins_over_top_intent() {
        let response = parsed(serde_json::json!({
            "output": {"intents": [{"intent": "FAQ", "confidence": 0.91}]},
            "context": {
                "skills": {"main skill": {"user_defined": {"skill_transfer": "TICKETS"}}}
            }
        }));
        let result = classification("open a ticket", &response);
        assert_eq!(result.skill_transfer.as_deref(), Some("TICKETS"));
        // Top class still reflects the classifier, not the transfer.
        assert_eq!(result.top_class, "FAQ");
    }

    #[test]
    fn test_rendered_prompts_carry_over_in_declared_order() {
        let response = parsed(serde_json::json!({
            "output": {
                "intents": [],
                "generic": [
                    {"response_type": "text", "text": "Did you mean A?"},
                    {"response_type": "text", "text": "Or B?"}
                ]
            },
            "context": {}
        }));
        let result = classification("ambiguous", &response);
        let texts: Vec<_> = result
            .response
            .iter()
            .map(|message| message.display_text().to_string())
            .collect();
        assert_eq!(texts, vec!["Did you mean A?", "Or B?"]);
    }
}
