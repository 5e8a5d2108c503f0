//! Application layer: the turn router and the reply aggregation protocol.

mod aggregator;
mod orchestrator;

pub use aggregator::ReplyAggregator;
pub use orchestrator::{Orchestrator, OrchestratorError};
