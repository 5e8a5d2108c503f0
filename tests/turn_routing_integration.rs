//! End-to-end turn routing through the orchestrator with in-process
//! adapters: memory session store, recording transport, scripted NLU, and a
//! scriptable backend stub.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use switchboard::adapters::bots::EchoBot;
use switchboard::adapters::nlu::ScriptedNlu;
use switchboard::adapters::session::MemorySessionStore;
use switchboard::adapters::transport::RecordingTransport;
use switchboard::application::Orchestrator;
use switchboard::config::EchoBotConfig;
use switchboard::domain::{MessageEvent, NluResult, OrchestratorResponse, ReplyStream, Session};
use switchboard::domain::ConversationRegistry;
use switchboard::ports::{BotAdapter, BotError, NluError, SessionStore};

/// Scriptable backend: replays queued reply batches and reports
/// configurable completion/confidence flags.
struct StubBot {
    name: String,
    skills: Vec<String>,
    registry: ConversationRegistry,
    replies: Mutex<VecDeque<Vec<OrchestratorResponse>>>,
    complete: AtomicBool,
    low_confidence: AtomicBool,
    fail_next: AtomicBool,
}

impl StubBot {
    fn new(name: &str, skill: &str) -> Self {
        Self {
            name: name.to_string(),
            skills: vec![skill.to_string()],
            registry: ConversationRegistry::new(),
            replies: Mutex::new(VecDeque::new()),
            complete: AtomicBool::new(false),
            low_confidence: AtomicBool::new(false),
            fail_next: AtomicBool::new(false),
        }
    }

    async fn enqueue_reply(&self, messages: Vec<OrchestratorResponse>) {
        self.replies.lock().await.push_back(messages);
    }

    fn set_complete(&self, value: bool) {
        self.complete.store(value, Ordering::SeqCst);
    }

    fn set_low_confidence(&self, value: bool) {
        self.low_confidence.store(value, Ordering::SeqCst);
    }

    fn fail_next_turn(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    async fn reply(&self, id: &str) -> Result<ReplyStream, BotError> {
        let stream = self.registry.new_reply_channel(id).await?;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            self.registry.fail(id, "stub backend down".to_string()).await?;
            return Ok(stream);
        }
        self.registry
            .set_complete(id, self.complete.load(Ordering::SeqCst))
            .await?;
        self.registry
            .set_low_confidence(id, self.low_confidence.load(Ordering::SeqCst))
            .await?;
        let messages = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| vec![OrchestratorResponse::text("stub reply")]);
        self.registry.deliver(id, messages).await?;
        Ok(stream)
    }
}

#[async_trait]
impl BotAdapter for StubBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    async fn start_chat(&self, id: &str, _session: &mut Session) -> Result<ReplyStream, BotError> {
        self.registry.start(id).await?;
        self.reply(id).await
    }

    async fn on_message(
        &self,
        _text: &str,
        session: &mut Session,
    ) -> Result<ReplyStream, BotError> {
        let id = session.conversation_id.clone();
        self.reply(&id).await
    }

    async fn end_chat(&self, id: &str) -> Result<(), BotError> {
        self.registry.end(id).await?;
        Ok(())
    }
}

struct Harness {
    store: Arc<MemorySessionStore>,
    transport: Arc<RecordingTransport>,
    nlu: Arc<ScriptedNlu>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            transport: Arc::new(RecordingTransport::new()),
            nlu: Arc::new(ScriptedNlu::new()),
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::clone(&self.store) as Arc<dyn SessionStore>,
            Arc::clone(&self.transport) as _,
        )
        .with_nlu(Arc::clone(&self.nlu) as _)
    }
}

fn message(conversation_id: &str, text: &str) -> MessageEvent {
    MessageEvent {
        conversation_id: conversation_id.to_string(),
        channel_id: "test".to_string(),
        from_id: "user-1".to_string(),
        message_id: None,
        text: text.to_string(),
        timestamp: Some(Utc::now()),
    }
}

fn transfer_to(skill: &str) -> NluResult {
    NluResult {
        text: String::new(),
        skill_transfer: Some(skill.to_string()),
        top_class: skill.to_lowercase(),
        classes: vec![],
        entities: vec![],
        response: vec![],
    }
}

#[tokio::test]
async fn test_turn_counter_is_monotonic_across_messages() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "first")).await.unwrap();
    orchestrator.process_message(message("conv-1", "second")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(session.turn, 2);
}

#[tokio::test]
async fn test_handoff_binds_conversation_to_backend() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    bot.enqueue_reply(vec![OrchestratorResponse::text("answer")]).await;
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(NluResult {
        response: vec![OrchestratorResponse::text("Transferring you now.")],
        ..transfer_to("FAQ")
    }))
    .await;
    orchestrator.process_message(message("conv-1", "faq please")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(session.active_bot_name, "FAQ");
    assert_eq!(session.turn_context.skill_name, "FAQ");
    assert!(bot.registry().contains("conv-1").await);
    assert_eq!(
        harness.transport.texts_for("conv-1"),
        vec!["Transferring you now.", "answer"]
    );
    // Both the prompt and the backend reply land in the turn output.
    assert_eq!(
        session.turn_context.output.text,
        vec!["Transferring you now.", "answer"]
    );
}

#[tokio::test]
async fn test_bound_backend_skips_nlu() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "first")).await.unwrap();
    assert_eq!(harness.nlu.call_count(), 1);

    // Flow is still open, so the second message goes straight to the bot.
    orchestrator.process_message(message("conv-1", "second")).await.unwrap();
    assert_eq!(harness.nlu.call_count(), 1);
}

#[tokio::test]
async fn test_completed_flow_reroutes_next_turn() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    bot.set_complete(true);
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "first")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert!(session.is_flow_completed);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "second")).await.unwrap();
    assert_eq!(harness.nlu.call_count(), 2);
}

#[tokio::test]
async fn test_low_confidence_reroutes_even_mid_flow() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    bot.set_low_confidence(true);
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "first")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert!(!session.is_flow_completed);
    assert!(session.is_low_confidence);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "second")).await.unwrap();
    assert_eq!(harness.nlu.call_count(), 2);
}

#[tokio::test]
async fn test_multi_message_reply_is_flushed_in_order() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    bot.enqueue_reply(vec![
        OrchestratorResponse::text("A"),
        OrchestratorResponse::text("B"),
    ])
    .await;
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "hi")).await.unwrap();

    assert_eq!(harness.transport.texts_for("conv-1"), vec!["A", "B"]);
    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(session.turn_context.output.text, vec!["A", "B"]);
}

#[tokio::test]
async fn test_nlu_prompts_sent_in_reverse_declared_order() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator();

    harness.nlu.enqueue(Ok(NluResult {
        skill_transfer: None,
        response: vec![
            OrchestratorResponse::text("first declared"),
            OrchestratorResponse::text("second declared"),
        ],
        ..transfer_to("none")
    }))
    .await;
    orchestrator.process_message(message("conv-1", "hello")).await.unwrap();

    assert_eq!(
        harness.transport.texts_for("conv-1"),
        vec!["second declared", "first declared"]
    );
    // The turn output keeps declared order.
    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(
        session.turn_context.output.text,
        vec!["first declared", "second declared"]
    );
}

#[tokio::test]
async fn test_unresolvable_skill_leaves_session_unbound() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator();

    harness.nlu.enqueue(Ok(transfer_to("NO_SUCH_SKILL"))).await;
    orchestrator.process_message(message("conv-1", "hello")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert!(!session.is_bound());
    assert_eq!(session.turn, 1);
    assert!(harness.transport.texts_for("conv-1").is_empty());
}

#[tokio::test]
async fn test_nlu_failure_abandons_turn_without_commit() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator();

    orchestrator.process_message(message("conv-1", "seed")).await.unwrap();
    let before = harness.store.get_session("conv-1").await.unwrap().unwrap();

    harness
        .nlu
        .enqueue(Err(NluError::Backend("classifier down".to_string())))
        .await;
    let result = orchestrator.process_message(message("conv-1", "boom")).await;
    assert!(result.is_err());

    // Nothing was sent and the stored session is the pre-turn one.
    assert!(harness.transport.texts_for("conv-1").is_empty());
    let after = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(after.turn, before.turn);
}

#[tokio::test]
async fn test_backend_error_signal_abandons_turn() {
    let harness = Harness::new();
    let bot = Arc::new(StubBot::new("FAQ", "FAQ"));
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&bot) as _);

    harness.nlu.enqueue(Ok(transfer_to("FAQ"))).await;
    orchestrator.process_message(message("conv-1", "first")).await.unwrap();
    let before = harness.store.get_session("conv-1").await.unwrap().unwrap();
    harness.transport.clear();

    bot.fail_next_turn();
    let result = orchestrator.process_message(message("conv-1", "second")).await;
    assert!(result.is_err());
    assert!(harness.transport.texts_for("conv-1").is_empty());
    let after = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(after.turn, before.turn);
}

#[tokio::test]
async fn test_echo_backend_round_trip() {
    let harness = Harness::new();
    let echo = Arc::new(EchoBot::new(&EchoBotConfig::default()));
    let orchestrator = harness.orchestrator().add_bot(Arc::clone(&echo) as _);

    harness.nlu.enqueue(Ok(transfer_to("DEFAULT"))).await;
    orchestrator.process_message(message("conv-1", "ping")).await.unwrap();

    assert_eq!(harness.transport.texts_for("conv-1"), vec!["[EchoBot] ping"]);
    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    // Echo completes every turn, so the next message re-routes.
    assert!(session.is_flow_completed);
    assert_eq!(session.active_bot_name, "EchoBot");
}

#[tokio::test]
async fn test_first_message_creates_session_with_greeting() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator();

    orchestrator.process_message(message("conv-1", "hello")).await.unwrap();

    let session = harness.store.get_session("conv-1").await.unwrap().unwrap();
    assert_eq!(session.conversation_id, "conv-1");
    assert_eq!(session.user_profile.id, "user-1");
    assert_eq!(session.turn, 1);
}
