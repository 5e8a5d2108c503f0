//! NLU service adapters: the HTTP assistant client and a scripted test
//! double.

mod assistant;
mod scripted;
pub(crate) mod wire;

pub use assistant::AssistantNlu;
pub use scripted::ScriptedNlu;
