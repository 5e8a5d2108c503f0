//! Ticketing backend with asynchronous HTTP callbacks.
//!
//! Outbound turns are fire-and-forget POSTs to the ticketing service; the
//! service replies later with a callback to our ingress, which lands here in
//! [`HelpdeskBot::handle_callback`] and resolves the pending reply channel.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::HelpdeskBotConfig;
use crate::domain::{
    ConversationError, ConversationRegistry, OrchestratorResponse, ReplyStream, ResponseOption,
    Session,
};
use crate::ports::{BotAdapter, BotError};

/// One UI element in a callback body, in the backend's native vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct HelpdeskUiElement {
    #[serde(rename = "uiType")]
    pub ui_type: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Deferred reply delivered by the ticketing service to our ingress.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpdeskCallback {
    pub conversation_id: String,
    /// Backend-side session token, echoed on subsequent turns.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Whether the ticketing dialog reached its end.
    #[serde(default)]
    pub completed: bool,
    /// 0 when the backend did not understand the utterance, 1 otherwise.
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default)]
    pub body: Vec<HelpdeskUiElement>,
}

fn default_score() -> f64 {
    1.0
}

pub struct HelpdeskBot {
    name: String,
    skills: Vec<String>,
    registry: ConversationRegistry,
    client: reqwest::Client,
    service_url: String,
    user_name: Option<String>,
    user_password: Option<Secret<String>>,
    api_token: Option<Secret<String>>,
    confidence_threshold: f64,
}

impl HelpdeskBot {
    pub fn new(config: &HelpdeskBotConfig) -> Result<Self, BotError> {
        let service_url = config
            .service_url
            .clone()
            .ok_or_else(|| BotError::Backend("service url not configured".to_string()))?;
        Ok(Self {
            name: config.name.clone(),
            skills: config.skills.clone(),
            registry: ConversationRegistry::new(),
            client: reqwest::Client::new(),
            service_url,
            user_name: config.user_name.clone(),
            user_password: config.user_password.clone(),
            api_token: config.api_token.clone(),
            confidence_threshold: config.confidence_threshold,
        })
    }

    /// Maps one callback UI element into presentation messages. Unknown
    /// element kinds degrade to their text payload rather than being dropped.
    fn element_response(&self, element: &HelpdeskUiElement) -> Option<OrchestratorResponse> {
        let brand = |value: &str| format!("[{}] {}", self.name, value);
        match element.ui_type.as_str() {
            "OutputText" => element
                .value
                .as_deref()
                .map(|value| OrchestratorResponse::text(brand(value))),
            "InputText" => element
                .label
                .as_deref()
                .map(|label| OrchestratorResponse::text(brand(label))),
            "Picker" => Some(OrchestratorResponse::Option {
                title: brand(element.label.as_deref().unwrap_or("Please choose")),
                description: None,
                options: element
                    .options
                    .iter()
                    .flatten()
                    .map(|option| ResponseOption {
                        label: option.clone(),
                        value: option.clone(),
                    })
                    .collect(),
            }),
            other => {
                debug!(ui_type = other, "unrecognized callback element");
                element
                    .value
                    .as_deref()
                    .or(element.label.as_deref())
                    .map(|value| OrchestratorResponse::text(brand(value)))
            }
        }
    }

    fn format_response(&self, body: &[HelpdeskUiElement]) -> Vec<OrchestratorResponse> {
        body.iter()
            .filter_map(|element| self.element_response(element))
            .collect()
    }

    async fn post_turn(
        &self,
        id: &str,
        action: &str,
        message: &str,
        session: &Session,
    ) -> Result<ReplyStream, BotError> {
        let stream = self.registry.new_reply_channel(id).await?;

        let backend_session_id = session
            .bot_context
            .get(&self.name)
            .and_then(|context| context.get("backend_session_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let payload = serde_json::json!({
            "requestId": Uuid::new_v4().to_string(),
            "action": action,
            "conversationId": id,
            "sessionId": backend_session_id,
            "userId": session.user_profile.id,
            "message": message,
        });

        let mut request = self
            .client
            .post(format!("{}/bot/integration", self.service_url.trim_end_matches('/')))
            .json(&payload);
        if let (Some(user), Some(password)) = (&self.user_name, &self.user_password) {
            request = request.basic_auth(user, Some(password.expose_secret()));
        }
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(conversation_id = id, action, "ticketing turn accepted");
            }
            Ok(response) => {
                let reason = format!("ticketing service returned status {}", response.status());
                warn!(conversation_id = id, %reason, "ticketing turn rejected");
                self.registry.fail(id, reason).await?;
            }
            Err(error) => {
                warn!(conversation_id = id, %error, "ticketing turn failed");
                self.registry.fail(id, error.to_string()).await?;
            }
        }
        Ok(stream)
    }

    /// Resolves the pending reply channel for a conversation from a backend
    /// callback. Fails with `NotFound` when no such conversation is active.
    pub async fn handle_callback(
        &self,
        callback: HelpdeskCallback,
    ) -> Result<(), ConversationError> {
        let id = callback.conversation_id.as_str();
        let low_confidence = callback.score < self.confidence_threshold;
        debug!(
            conversation_id = id,
            completed = callback.completed,
            score = callback.score,
            "ticketing callback"
        );

        self.registry.set_complete(id, callback.completed).await?;
        self.registry.set_low_confidence(id, low_confidence).await?;
        if let Some(session_id) = &callback.session_id {
            self.registry
                .set_context(id, serde_json::json!({ "backend_session_id": session_id }))
                .await?;
        }
        self.registry
            .deliver(id, self.format_response(&callback.body))
            .await
    }
}

#[async_trait]
impl BotAdapter for HelpdeskBot {
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
        let message = session.turn_context.input.text.clone();
        self.post_turn(id, "START_CONVERSATION", &message, session)
            .await
    }

    async fn on_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<ReplyStream, BotError> {
        let id = session.conversation_id.clone();
        self.post_turn(&id, "MESSAGE", text, session).await
    }

    async fn end_chat(&self, id: &str) -> Result<(), BotError> {
        self.registry.end(id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for HelpdeskBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpdeskBot")
            .field("name", &self.name)
            .field("service_url", &self.service_url)
            .finish_non_exhaustive()
    }
}
