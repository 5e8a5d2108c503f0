//! Dialog-tree backend driven by a stateless assistant endpoint.
//!
//! Unlike the primary NLU service, this adapter keeps the assistant's dialog
//! context in its own conversation registry rather than in the session's
//! `bot_context`, since the context only matters while this backend owns the
//! conversation.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use tracing::{debug, warn};

use crate::adapters::nlu::wire::{user_defined, AssistantResponse};
use crate::config::DialogBotConfig;
use crate::domain::{ConversationRegistry, OrchestratorResponse, ReplyStream, Session};
use crate::ports::{BotAdapter, BotError};

pub struct DialogBot {
    name: String,
    skills: Vec<String>,
    registry: ConversationRegistry,
    client: reqwest::Client,
    service_url: String,
    assistant_id: String,
    version: String,
    api_key: Secret<String>,
    confidence_threshold: f64,
}

impl DialogBot {
    pub fn new(config: &DialogBotConfig) -> Result<Self, BotError> {
        let service_url = config
            .service_url
            .clone()
            .ok_or_else(|| BotError::Backend("service url not configured".to_string()))?;
        let assistant_id = config
            .assistant_id
            .clone()
            .ok_or_else(|| BotError::Backend("assistant id not configured".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| BotError::Backend("api key not configured".to_string()))?;
        Ok(Self {
            name: config.name.clone(),
            skills: config.skills.clone(),
            registry: ConversationRegistry::new(),
            client: reqwest::Client::new(),
            service_url,
            assistant_id,
            version: config.version.clone(),
            api_key,
            confidence_threshold: config.confidence_threshold,
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

    async fn call_assistant(
        &self,
        text: &str,
        context: serde_json::Value,
    ) -> Result<AssistantResponse, BotError> {
        let body = serde_json::json!({
            "input": { "message_type": "text", "text": text },
            "context": context,
        });
        let response = self
            .client
            .post(self.message_url())
            .basic_auth("apikey", Some(self.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BotError::Backend(format!(
                "assistant returned status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))
    }

    fn format_response(&self, response: &AssistantResponse) -> Vec<OrchestratorResponse> {
        response
            .output
            .generic
            .iter()
            .map(|generic| generic.to_response(Some(&self.name)))
            .collect()
    }

    async fn converse(&self, id: &str, text: &str, session: &Session) -> Result<ReplyStream, BotError> {
        let stream = self.registry.new_reply_channel(id).await?;
        let context = self.registry.snapshot(id).await?.context;

        match self.call_assistant(text, context).await {
            Ok(parsed) => {
                let completed = user_defined(&parsed.context, "completed")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                // Low confidence only when classification happened and every
                // candidate scored below the threshold.
                let low_confidence = !parsed.output.intents.is_empty()
                    && parsed
                        .output
                        .intents
                        .iter()
                        .all(|intent| intent.confidence < self.confidence_threshold);
                debug!(
                    conversation_id = id,
                    completed, low_confidence, "dialog turn classified"
                );

                self.registry.set_context(id, parsed.context.clone()).await?;
                self.registry.set_complete(id, completed).await?;
                self.registry.set_low_confidence(id, low_confidence).await?;

                let mut turn_context = session.turn_context.clone();
                turn_context.skill_name = self.name.clone();
                turn_context.intents = parsed
                    .output
                    .intents
                    .iter()
                    .map(|intent| intent.to_domain())
                    .collect();
                turn_context.entities = parsed
                    .output
                    .entities
                    .iter()
                    .map(|entity| entity.to_domain())
                    .collect();
                self.registry.set_turn_context(id, turn_context).await?;

                self.registry.deliver(id, self.format_response(&parsed)).await?;
            }
            Err(error) => {
                warn!(conversation_id = id, %error, "dialog turn failed");
                self.registry.fail(id, error.to_string()).await?;
            }
        }
        Ok(stream)
    }
}

#[async_trait]
impl BotAdapter for DialogBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    async fn start_chat(&self, id: &str, session: &mut Session) -> Result<ReplyStream, BotError> {
        self.registry.start(id).await?;
        let text = session.turn_context.input.text.clone();
        self.converse(id, &text, session).await
    }

    async fn on_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<ReplyStream, BotError> {
        let id = session.conversation_id.clone();
        self.converse(&id, text, session).await
    }

    async fn end_chat(&self, id: &str) -> Result<(), BotError> {
        self.registry.end(id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DialogBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogBot")
            .field("name", &self.name)
            .field("service_url", &self.service_url)
            .field("assistant_id", &self.assistant_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> DialogBot {
        DialogBot::new(&DialogBotConfig {
            enabled: true,
            name: "DialogBot".to_string(),
            skills: vec!["ORDERS".to_string()],
            service_url: Some("https://assistant.example.com".to_string()),
            assistant_id: Some("asst-1".to_string()),
            version: "2021-11-27".to_string(),
            api_key: Some(Secret::new("key".to_string())),
            confidence_threshold: 0.5,
        })
        .unwrap()
    }

    #[test]
    fn test_message_url_includes_assistant_and_version() {
        assert_eq!(
            bot().message_url(),
            "https://assistant.example.com/v2/assistants/asst-1/message/stateless?version=2021-11-27"
        );
    }

    #[test]
    fn test_format_response_brands_messages() {
        let parsed: AssistantResponse = serde_json::from_value(serde_json::json!({
            "output": {
                "generic": [
                    {"response_type": "text", "text": "Your order shipped."}
                ]
            },
            "context": {}
        }))
        .unwrap();
        let messages = bot().format_response(&parsed);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].display_text(), "[DialogBot] Your order shipped.");
    }

    #[test]
    fn test_completed_flag_read_from_user_defined_context() {
        let context = serde_json::json!({
            "skills": {"main skill": {"user_defined": {"completed": true}}}
        });
        assert_eq!(
            user_defined(&context, "completed").and_then(|v| v.as_bool()),
            Some(true)
        );
    }
}
