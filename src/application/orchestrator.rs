//! Turn Router - the per-turn state machine.
//!
//! For each inbound turn the router decides whether to invoke the NLU
//! backend, which secondary adapter (if any) receives the turn, and how
//! NLU-produced and adapter-produced replies merge before session state is
//! committed. Conceptually a session is in one of two states per turn:
//! needs-routing (no active bot, or the active bot finished or reported
//! low confidence) versus bound-to-bot (an active bot owns the turn
//! outright).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::domain::{
    ConversationError, MembersAddedEvent, MessageEvent, OrchestratorResponse, Session,
};
use crate::ports::{
    BotAdapter, BotError, ChannelTransport, ConversationLogger, NluError, NluService,
    SessionStore, SessionStoreError, TransportError, TurnRecord,
};

use super::aggregator::ReplyAggregator;

const GREETING_NEW_MEMBER: &str = "Hello and welcome!";
const GREETING_RETURNING: &str = "Welcome back";
const TURN_ERROR_TEXT: &str = "The bot encountered an error or bug.";

/// Turn-level failure. The turn is abandoned: no session write-back, no
/// reply beyond what was already sent. The next inbound turn loads
/// whatever session was last successfully committed.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error(transparent)]
    Nlu(#[from] NluError),

    #[error(transparent)]
    Bot(#[from] BotError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// The turn router. Owns the registered backends and the collaborator
/// handles; built once at startup and shared across turns.
pub struct Orchestrator {
    bots: Vec<Arc<dyn BotAdapter>>,
    nlu: Option<Arc<dyn NluService>>,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn ChannelTransport>,
    logger: Option<Arc<dyn ConversationLogger>>,
    aggregator: ReplyAggregator,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn SessionStore>, transport: Arc<dyn ChannelTransport>) -> Self {
        let aggregator = ReplyAggregator::new(Arc::clone(&store), Arc::clone(&transport), None);
        Self {
            bots: Vec::new(),
            nlu: None,
            store,
            transport,
            logger: None,
            aggregator,
        }
    }

    /// Registers the primary NLU service.
    pub fn with_nlu(mut self, nlu: Arc<dyn NluService>) -> Self {
        self.nlu = Some(nlu);
        self
    }

    /// Registers the conversation analytics sink.
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = Some(Arc::clone(&logger));
        self.aggregator = ReplyAggregator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.transport),
            Some(logger),
        );
        self
    }

    /// Registers a secondary backend.
    pub fn add_bot(mut self, bot: Arc<dyn BotAdapter>) -> Self {
        self.bots.push(bot);
        self
    }

    /// The backend serving the given skill tag, if any.
    pub fn bot_by_skill(&self, skill: &str) -> Option<&Arc<dyn BotAdapter>> {
        self.bots
            .iter()
            .find(|bot| bot.skills().iter().any(|s| s == skill))
    }

    pub fn bot_by_name(&self, name: &str) -> Option<&Arc<dyn BotAdapter>> {
        self.bots.iter().find(|bot| bot.name() == name)
    }

    /// Handles one inbound utterance end to end.
    pub async fn process_message(&self, event: MessageEvent) -> Result<(), OrchestratorError> {
        let conversation_id = event.conversation_id.clone();
        let timestamp = event.timestamp.unwrap_or_else(Utc::now);

        let mut session = match self.store.get_session(&conversation_id).await? {
            Some(session) => session,
            None => {
                self.init_session(
                    &conversation_id,
                    &event.channel_id,
                    &event.from_id,
                    &event.text,
                    GREETING_RETURNING,
                )
                .await?
            }
        };
        debug!(conversation_id, turn = session.turn, "loaded session");

        session.begin_turn(event.message_id.clone(), event.text.clone(), timestamp);

        let mut bot: Option<Arc<dyn BotAdapter>> = if session.is_bound() {
            self.bot_by_name(&session.active_bot_name).cloned()
        } else {
            None
        };

        let needs_routing =
            session.is_flow_completed || session.is_low_confidence || bot.is_none();

        if let (Some(nlu), true) = (&self.nlu, needs_routing) {
            let nlu_result = nlu.send_message(&event.text, &mut session).await?;
            debug!(
                conversation_id,
                top_class = nlu_result.top_class,
                skill_transfer = ?nlu_result.skill_transfer,
                "NLU response"
            );

            if !nlu_result.is_empty_response() {
                session.fold_output(&nlu_result.response);
                // NLU-authored disambiguation prompts are sent in reverse of
                // declared order so the most salient prompt lands closest to
                // the user's next reply.
                for message in nlu_result.response.iter().rev() {
                    self.transport.send(&conversation_id, message).await?;
                }
            }

            bot = match nlu_result.skill_transfer.as_deref() {
                Some(skill) if !skill.is_empty() => match self.bot_by_skill(skill) {
                    Some(resolved) => {
                        session.turn_context.skill_name = skill.to_string();
                        Some(Arc::clone(resolved))
                    }
                    None => {
                        warn!(conversation_id, skill, "no backend serves transferred skill");
                        self.finish_unrouted(&conversation_id, &mut session).await?;
                        return Ok(());
                    }
                },
                _ => {
                    self.finish_unrouted(&conversation_id, &mut session).await?;
                    return Ok(());
                }
            };
        }

        match bot {
            Some(bot) => {
                debug!(
                    conversation_id,
                    bot = bot.name(),
                    text = event.text,
                    "forwarding message to backend"
                );
                let stream = if bot.registry().contains(&conversation_id).await {
                    bot.on_message(&event.text, &mut session).await?
                } else {
                    bot.start_chat(&conversation_id, &mut session).await?
                };
                self.aggregator
                    .aggregate(bot.as_ref(), &conversation_id, session, stream)
                    .await?;
            }
            None => {
                // Dead-end turn: no bound backend and no NLU configured.
                // Accepted but never answered; the session is still
                // committed so the turn counter stays monotonic.
                debug!(conversation_id, "no backend available to handle message");
                self.store.set_session(&conversation_id, &session).await?;
            }
        }

        Ok(())
    }

    /// Handles a member-added event: greets each joining member (except the
    /// bot itself) and creates a fresh session.
    pub async fn process_members_added(
        &self,
        event: MembersAddedEvent,
    ) -> Result<(), OrchestratorError> {
        debug!(conversation_id = event.conversation_id, "members added");
        for member_id in &event.member_ids {
            if member_id != &event.recipient_id {
                self.transport
                    .send(
                        &event.conversation_id,
                        &OrchestratorResponse::text(GREETING_NEW_MEMBER),
                    )
                    .await?;
            }
        }
        let session = self
            .init_session(
                &event.conversation_id,
                &event.channel_id,
                &event.from_id,
                "",
                GREETING_NEW_MEMBER,
            )
            .await?;
        self.push_turn_record(&session);
        Ok(())
    }

    /// Notifies the user that the turn failed, best effort. Called by the
    /// ingress layer when `process_message` errors.
    pub async fn send_turn_error_notice(&self, conversation_id: &str) {
        let notice = OrchestratorResponse::text(TURN_ERROR_TEXT);
        if let Err(err) = self.transport.send(conversation_id, &notice).await {
            error!(conversation_id, error = %err, "failed to deliver turn error notice");
        }
    }

    async fn init_session(
        &self,
        conversation_id: &str,
        channel_id: &str,
        user_id: &str,
        input_text: &str,
        greeting: &str,
    ) -> Result<Session, OrchestratorError> {
        let session = Session::new(
            conversation_id,
            channel_id,
            user_id,
            input_text,
            greeting,
            Utc::now(),
        );
        self.store.set_session(conversation_id, &session).await?;
        Ok(session)
    }

    /// Ends a turn that resolved to no backend: the session is unbound for
    /// the next turn, committed, and logged.
    async fn finish_unrouted(
        &self,
        conversation_id: &str,
        session: &mut Session,
    ) -> Result<(), OrchestratorError> {
        session.active_bot_name.clear();
        self.store.set_session(conversation_id, session).await?;
        self.push_turn_record(session);
        Ok(())
    }

    /// Fire-and-forget analytics push; failures never block the turn.
    fn push_turn_record(&self, session: &Session) {
        if let Some(logger) = &self.logger {
            let logger = Arc::clone(logger);
            let record = TurnRecord::from_session(session);
            tokio::spawn(async move {
                if let Err(err) = logger.push(record).await {
                    warn!(error = %err, "conversation data push failed");
                }
            });
        }
    }
}
