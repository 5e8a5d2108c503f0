//! Domain model: pure data types and the adapter-scoped conversation
//! registry. No I/O lives here; invariants on sessions are enforced by the
//! turn router in the application layer.

pub mod conversation;
pub mod event;
pub mod nlu;
pub mod response;
pub mod session;

pub use conversation::{
    BotConversation, ConversationError, ConversationRegistry, ConversationSnapshot, ReplyEvent,
    ReplyStream,
};
pub use event::{MembersAddedEvent, MessageEvent};
pub use nlu::{NluClass, NluResult};
pub use response::{OrchestratorResponse, ResponseOption};
pub use session::{
    Entity, FlowInformation, Intent, Session, TurnContext, TurnInput, TurnOutput, UserProfile,
};
