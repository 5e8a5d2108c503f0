//! Ports - contracts between the turn router and its external
//! collaborators. Concrete backends, stores, sinks, and transports live
//! behind these traits in `adapters/`.

mod bot_adapter;
mod channel_transport;
mod conversation_logger;
mod nlu_service;
mod session_store;

pub use bot_adapter::{BotAdapter, BotError};
pub use channel_transport::{ChannelTransport, TransportError};
pub use conversation_logger::{
    ConversationLogger, LogResult, LoggerError, TurnRecord, TurnRecordContext, TurnRecordData,
};
pub use nlu_service::{NluError, NluService};
pub use session_store::{SessionStore, SessionStoreError};
