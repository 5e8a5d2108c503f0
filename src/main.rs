//! Process entrypoint: loads configuration, wires the adapters into the
//! turn router, and serves the HTTP ingress.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use switchboard::adapters::bots::{DialogBot, EchoBot, HelpdeskBot, QnaBot};
use switchboard::adapters::http::{app_router, AppState};
use switchboard::adapters::logger::{PostgresLogger, RestLogger};
use switchboard::adapters::nlu::AssistantNlu;
use switchboard::adapters::session::{MemorySessionStore, RedisSessionStore};
use switchboard::adapters::transport::WebhookTransport;
use switchboard::application::Orchestrator;
use switchboard::config::{AppConfig, LoggerSinkKind, SessionStoreKind};
use switchboard::ports::{BotAdapter, ConversationLogger, SessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    info!(
        port = config.server.port,
        store = ?config.session.store,
        "starting switchboard"
    );

    let store: Arc<dyn SessionStore> = match config.session.store {
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreKind::Cache => Arc::new(RedisSessionStore::connect(&config.session).await?),
    };
    store.init().await?;

    let transport = Arc::new(WebhookTransport::new(&config.transport)?);
    let mut orchestrator = Orchestrator::new(store, transport);

    if config.nlu.enabled {
        orchestrator = orchestrator.with_nlu(Arc::new(AssistantNlu::new(&config.nlu)?));
        info!("NLU routing enabled");
    }

    if config.logger.enabled {
        let logger: Arc<dyn ConversationLogger> = match config.logger.sink {
            LoggerSinkKind::RestApi => Arc::new(RestLogger::new(&config.logger.rest)?),
            LoggerSinkKind::Postgres => {
                Arc::new(PostgresLogger::connect(&config.logger.postgres).await?)
            }
        };
        logger.init().await?;
        orchestrator = orchestrator.with_logger(logger);
    }

    if config.bots.echo.enabled {
        let echo = Arc::new(EchoBot::new(&config.bots.echo));
        info!(name = echo.name(), "registered echo backend");
        orchestrator = orchestrator.add_bot(echo);
    }
    if config.bots.qna.enabled {
        let qna = Arc::new(QnaBot::new(&config.bots.qna)?);
        qna.init().await?;
        info!(name = qna.name(), "registered knowledge-base backend");
        orchestrator = orchestrator.add_bot(qna);
    }
    if config.bots.dialog.enabled {
        let dialog = Arc::new(DialogBot::new(&config.bots.dialog)?);
        info!(name = dialog.name(), "registered dialog backend");
        orchestrator = orchestrator.add_bot(dialog);
    }

    // The ticketing backend is also exposed to the ingress directly, for
    // its deferred-reply callback endpoint.
    let mut helpdesk: Option<Arc<HelpdeskBot>> = None;
    if config.bots.helpdesk.enabled {
        let bot = Arc::new(HelpdeskBot::new(&config.bots.helpdesk)?);
        info!(name = bot.name(), "registered ticketing backend");
        orchestrator = orchestrator.add_bot(Arc::clone(&bot) as Arc<dyn BotAdapter>);
        helpdesk = Some(bot);
    }

    let mut state = AppState::new(Arc::new(orchestrator));
    if let Some(helpdesk) = helpdesk {
        state = state.with_helpdesk(helpdesk);
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));
    if config.server.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
