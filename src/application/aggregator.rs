//! Reply Aggregator - buffer-then-flush consumption of an adapter's reply
//! channel.
//!
//! Backend replies may be a multi-message sequence (a rich prompt followed
//! by a retry, say) and only the true final ordering is known once the
//! channel completes, so replies are never streamed opportunistically:
//! they are buffered in arrival order, the session is updated from the
//! conversation's backend-declared state, and only then flushed to the
//! transport one awaited send at a time.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{OrchestratorResponse, ReplyEvent, ReplyStream, Session};
use crate::ports::{
    BotAdapter, BotError, ChannelTransport, ConversationLogger, SessionStore, TurnRecord,
};

use super::orchestrator::OrchestratorError;

/// Consumes one reply channel per turn and commits its outcome.
pub struct ReplyAggregator {
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn ChannelTransport>,
    logger: Option<Arc<dyn ConversationLogger>>,
}

impl ReplyAggregator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn ChannelTransport>,
        logger: Option<Arc<dyn ConversationLogger>>,
    ) -> Self {
        Self {
            store,
            transport,
            logger,
        }
    }

    /// Drains the reply channel, then: derives the session's routing flags
    /// from the conversation the adapter just updated, folds buffered
    /// messages into the turn output, flushes them to the transport in
    /// buffer order (awaiting each send), writes the session back, and
    /// pushes a turn record to the analytics sink fire-and-forget.
    ///
    /// An error event on the channel abandons the turn: no sends, no
    /// session write-back.
    pub async fn aggregate(
        &self,
        bot: &dyn BotAdapter,
        conversation_id: &str,
        mut session: Session,
        mut stream: ReplyStream,
    ) -> Result<Session, OrchestratorError> {
        let mut messages: Vec<OrchestratorResponse> = Vec::new();
        while let Some(event) = stream.recv().await {
            match event {
                ReplyEvent::Message(message) => {
                    debug!(
                        bot = bot.name(),
                        conversation_id,
                        message = message.display_text(),
                        "buffered reply"
                    );
                    messages.push(message);
                }
                ReplyEvent::Error(reason) => {
                    return Err(OrchestratorError::Bot(BotError::Backend(reason)));
                }
            }
        }

        // The session never second-guesses the adapter's own completion and
        // confidence judgment: all routing flags come from the conversation
        // state the adapter updated this turn.
        let snapshot = bot.registry().snapshot(conversation_id).await?;
        session.is_low_confidence = snapshot.low_confidence;
        session.is_flow_completed = snapshot.complete;
        session.active_bot_name = bot.name().to_string();
        session
            .bot_context
            .insert(bot.name().to_string(), snapshot.context);
        if let Some(turn_context) = snapshot.turn_context {
            session.turn_context = turn_context;
        }

        session.fold_output(&messages);

        // Staggered sends enforce presentation order.
        for message in &messages {
            self.transport.send(conversation_id, message).await?;
        }

        self.store.set_session(conversation_id, &session).await?;

        if let Some(logger) = &self.logger {
            let logger = Arc::clone(logger);
            let record = TurnRecord::from_session(&session);
            tokio::spawn(async move {
                if let Err(err) = logger.push(record).await {
                    warn!(error = %err, "conversation data push failed");
                }
            });
        }

        Ok(session)
    }
}
