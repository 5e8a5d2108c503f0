//! Knowledge-base lookup backend.
//!
//! Each question is answered with a single best-match lookup against a QnA
//! knowledge base; every query completes the flow, so consecutive questions
//! each re-route through NLU. When no knowledge base id is configured the
//! adapter bootstraps a small default one through the authoring endpoint.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QnaBotConfig;
use crate::domain::{
    ConversationRegistry, Entity, Intent, OrchestratorResponse, ReplyStream, Session,
};
use crate::ports::{BotAdapter, BotError};

/// Seed question/answer pairs used when bootstrapping a knowledge base.
const DEFAULT_QNA: &[(&str, &str)] = &[
    ("What are your opening hours?", "We are open 9am to 5pm, Monday to Friday."),
    ("How do I reset my password?", "Use the 'Forgot password' link on the sign-in page."),
    ("How can I contact support?", "Email support@example.com or ask me to open a ticket."),
];

const CREATE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CREATE_POLL_ATTEMPTS: u32 = 30;

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct Answer {
    answer: String,
    /// Match score on a 0-100 scale.
    score: f64,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    operation_state: String,
    #[serde(default)]
    resource_location: Option<String>,
}

pub struct QnaBot {
    name: String,
    skills: Vec<String>,
    registry: ConversationRegistry,
    client: reqwest::Client,
    runtime_endpoint: String,
    endpoint_key: Secret<String>,
    authoring_endpoint: Option<String>,
    subscription_key: Option<Secret<String>>,
    knowledge_base_id: RwLock<Option<String>>,
    confidence_threshold: f64,
}

impl QnaBot {
    pub fn new(config: &QnaBotConfig) -> Result<Self, BotError> {
        let runtime_endpoint = config
            .runtime_endpoint
            .clone()
            .ok_or_else(|| BotError::Backend("runtime endpoint not configured".to_string()))?;
        let endpoint_key = config
            .endpoint_key
            .clone()
            .ok_or_else(|| BotError::Backend("endpoint key not configured".to_string()))?;
        Ok(Self {
            name: config.name.clone(),
            skills: config.skills.clone(),
            registry: ConversationRegistry::new(),
            client: reqwest::Client::new(),
            runtime_endpoint,
            endpoint_key,
            authoring_endpoint: config.authoring_endpoint.clone(),
            subscription_key: config.subscription_key.clone(),
            knowledge_base_id: RwLock::new(config.knowledge_base_id.clone()),
            confidence_threshold: config.confidence_threshold,
        })
    }

    /// Resolves the knowledge base id, creating a default base through the
    /// authoring endpoint when none is configured. Called once at startup.
    pub async fn init(&self) -> Result<(), BotError> {
        if self.knowledge_base_id.read().await.is_some() {
            return Ok(());
        }
        let id = self.create_default_knowledge_base().await?;
        info!(bot = %self.name, knowledge_base_id = %id, "bootstrapped default knowledge base");
        *self.knowledge_base_id.write().await = Some(id);
        Ok(())
    }

    async fn create_default_knowledge_base(&self) -> Result<String, BotError> {
        let authoring = self
            .authoring_endpoint
            .as_deref()
            .ok_or_else(|| BotError::Backend("authoring endpoint not configured".to_string()))?;
        let subscription_key = self
            .subscription_key
            .as_ref()
            .ok_or_else(|| BotError::Backend("subscription key not configured".to_string()))?;

        let qna_list: Vec<serde_json::Value> = DEFAULT_QNA
            .iter()
            .enumerate()
            .map(|(i, (question, answer))| {
                serde_json::json!({ "id": i, "questions": [question], "answer": answer })
            })
            .collect();
        let body = serde_json::json!({ "name": self.name, "qnaList": qna_list });

        let response = self
            .client
            .post(format!(
                "{}/knowledgebases/create",
                authoring.trim_end_matches('/')
            ))
            .header("Ocp-Apim-Subscription-Key", subscription_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BotError::Backend(format!(
                "knowledge base create returned status {}",
                response.status()
            )));
        }
        let created: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))?;
        let operation_id = created
            .get("operationId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BotError::Backend("create response missing operation id".to_string()))?
            .to_string();

        let operation = self.await_operation(authoring, subscription_key, &operation_id).await?;
        if !operation_succeeded(&operation.operation_state) {
            return Err(BotError::Backend(format!(
                "knowledge base create ended in state {}",
                operation.operation_state
            )));
        }
        let location = operation
            .resource_location
            .ok_or_else(|| BotError::Backend("operation missing resource location".to_string()))?;
        parse_knowledge_base_id(&location)
            .ok_or_else(|| BotError::Backend(format!("unexpected resource location: {location}")))
    }

    async fn await_operation(
        &self,
        authoring: &str,
        subscription_key: &Secret<String>,
        operation_id: &str,
    ) -> Result<OperationStatus, BotError> {
        for _ in 0..CREATE_POLL_ATTEMPTS {
            let status: OperationStatus = self
                .client
                .get(format!(
                    "{}/operations/{}",
                    authoring.trim_end_matches('/'),
                    operation_id
                ))
                .header("Ocp-Apim-Subscription-Key", subscription_key.expose_secret())
                .send()
                .await
                .map_err(|e| BotError::Backend(e.to_string()))?
                .json()
                .await
                .map_err(|e| BotError::Backend(e.to_string()))?;
            if status.operation_state != "Running" && status.operation_state != "NotStarted" {
                return Ok(status);
            }
            tokio::time::sleep(CREATE_POLL_INTERVAL).await;
        }
        Err(BotError::Backend(format!(
            "knowledge base operation {operation_id} did not settle"
        )))
    }

    async fn generate_answer(&self, question: &str) -> Result<Answer, BotError> {
        let kb_id = self
            .knowledge_base_id
            .read()
            .await
            .clone()
            .ok_or_else(|| BotError::Backend("knowledge base not initialized".to_string()))?;
        let response = self
            .client
            .post(format!(
                "{}/knowledgebases/{}/generateAnswer",
                self.runtime_endpoint.trim_end_matches('/'),
                kb_id
            ))
            .header(
                "Authorization",
                format!("EndpointKey {}", self.endpoint_key.expose_secret()),
            )
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BotError::Backend(format!(
                "generateAnswer returned status {}",
                response.status()
            )));
        }
        let mut parsed: AnswerResponse = response
            .json()
            .await
            .map_err(|e| BotError::Backend(e.to_string()))?;
        if parsed.answers.is_empty() {
            return Err(BotError::Backend("no answers returned".to_string()));
        }
        Ok(parsed.answers.remove(0))
    }

    fn format_response(&self, answer: &str) -> Vec<OrchestratorResponse> {
        vec![OrchestratorResponse::text(format!(
            "[{}] {}",
            self.name, answer
        ))]
    }

    async fn query(&self, id: &str, question: &str, session: &Session) -> Result<ReplyStream, BotError> {
        let stream = self.registry.new_reply_channel(id).await?;
        match self.generate_answer(question).await {
            Ok(answer) => {
                let low_confidence = answer.score < self.confidence_threshold * 100.0;
                debug!(
                    conversation_id = id,
                    score = answer.score,
                    low_confidence,
                    "knowledge base answer"
                );
                // A knowledge-base lookup has no multi-turn flow.
                self.registry.set_complete(id, true).await?;
                self.registry.set_low_confidence(id, low_confidence).await?;

                let mut turn_context = session.turn_context.clone();
                turn_context.skill_name = self.name.clone();
                turn_context.intents = answer
                    .questions
                    .iter()
                    .map(|question| Intent {
                        intent: question.clone(),
                        confidence: answer.score / 100.0,
                    })
                    .collect();
                turn_context.entities = answer
                    .metadata
                    .iter()
                    .map(|m| Entity {
                        entity: m.name.clone(),
                        value: m.value.clone(),
                        location: None,
                        confidence: None,
                    })
                    .collect();
                self.registry.set_turn_context(id, turn_context).await?;
                self.registry
                    .deliver(id, self.format_response(&answer.answer))
                    .await?;
            }
            Err(error) => {
                warn!(conversation_id = id, %error, "knowledge base lookup failed");
                self.registry.fail(id, error.to_string()).await?;
            }
        }
        Ok(stream)
    }
}

#[async_trait]
impl BotAdapter for QnaBot {
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
        let question = session.turn_context.input.text.clone();
        self.query(id, &question, session).await
    }

    async fn on_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<ReplyStream, BotError> {
        let id = session.conversation_id.clone();
        self.query(&id, text, session).await
    }

    async fn end_chat(&self, id: &str) -> Result<(), BotError> {
        self.registry.end(id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for QnaBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QnaBot")
            .field("name", &self.name)
            .field("runtime_endpoint", &self.runtime_endpoint)
            .finish_non_exhaustive()
    }
}

// Strict equality comparison: any other terminal state is a failure.
fn operation_succeeded(state: &str) -> bool {
    state == "Succeeded"
}

fn parse_knowledge_base_id(resource_location: &str) -> Option<String> {
    resource_location
        .strip_prefix("/knowledgebases/")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_knowledge_base_id() {
        assert_eq!(
            parse_knowledge_base_id("/knowledgebases/kb-123"),
            Some("kb-123".to_string())
        );
        assert_eq!(parse_knowledge_base_id("/knowledgebases/"), None);
        assert_eq!(parse_knowledge_base_id("/operations/op-1"), None);
    }

    #[test]
    fn test_only_succeeded_state_counts_as_success() {
        assert!(operation_succeeded("Succeeded"));
        assert!(!operation_succeeded("Failed"));
        assert!(!operation_succeeded("Cancelled"));
        // Case matters: the authoring API capitalizes terminal states.
        assert!(!operation_succeeded("succeeded"));
    }

    #[test]
    fn test_operation_status_deserializes_authoring_shape() {
        let json = serde_json::json!({
            "operationState": "Succeeded",
            "resourceLocation": "/knowledgebases/kb-123"
        });
        let parsed: OperationStatus = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.operation_state, "Succeeded");
        assert_eq!(
            parsed.resource_location.as_deref(),
            Some("/knowledgebases/kb-123")
        );
    }

    #[test]
    fn test_answer_response_deserializes_runtime_shape() {
        let json = serde_json::json!({
            "answers": [{
                "answer": "We are open 9 to 5.",
                "score": 82.5,
                "questions": ["What are your opening hours?"],
                "metadata": [{"name": "topic", "value": "hours"}]
            }]
        });
        let parsed: AnswerResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].score, 82.5);
        assert_eq!(parsed.answers[0].metadata[0].name, "topic");
    }
}
