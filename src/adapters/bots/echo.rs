//! Echo backend - repeats each utterance back, prefixed with the bot name.
//!
//! Serves as the catch-all `DEFAULT` skill and as a live smoke-test backend:
//! every turn completes the flow, so the next message re-routes through NLU.

use async_trait::async_trait;
use tracing::debug;

use crate::config::EchoBotConfig;
use crate::domain::{ConversationRegistry, OrchestratorResponse, ReplyStream, Session};
use crate::ports::{BotAdapter, BotError};

pub struct EchoBot {
    name: String,
    skills: Vec<String>,
    registry: ConversationRegistry,
}

impl EchoBot {
    pub fn new(config: &EchoBotConfig) -> Self {
        Self {
            name: config.name.clone(),
            skills: config.skills.clone(),
            registry: ConversationRegistry::new(),
        }
    }

    fn format_response(&self, text: &str) -> Vec<OrchestratorResponse> {
        vec![OrchestratorResponse::text(format!(
            "[{}] {}",
            self.name, text
        ))]
    }

    async fn echo(&self, id: &str, session: &Session) -> Result<ReplyStream, BotError> {
        let stream = self.registry.new_reply_channel(id).await?;
        // Echo has no flow to continue: every turn completes immediately.
        self.registry.set_complete(id, true).await?;
        let mut turn_context = session.turn_context.clone();
        turn_context.skill_name = self.name.clone();
        self.registry.set_turn_context(id, turn_context).await?;
        debug!(conversation_id = id, bot = %self.name, "echoing utterance");
        self.registry
            .deliver(id, self.format_response(&session.turn_context.input.text))
            .await?;
        Ok(stream)
    }
}

#[async_trait]
impl BotAdapter for EchoBot {
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
        self.echo(id, session).await
    }

    async fn on_message(
        &self,
        text: &str,
        session: &mut Session,
    ) -> Result<ReplyStream, BotError> {
        let id = session.conversation_id.clone();
        session.turn_context.input.text = text.to_string();
        self.echo(&id, session).await
    }

    async fn end_chat(&self, id: &str) -> Result<(), BotError> {
        self.registry.end(id).await?;
        Ok(())
    }
}
