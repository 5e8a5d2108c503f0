//! Switchboard - Multi-Backend Conversational Turn Orchestrator
//!
//! Routes a single conversational turn through a primary NLU intent
//! classification service and, depending on confidence and declared skill
//! transfers, hands the turn off to one of several secondary conversational
//! backends, then reassembles their streamed replies into an ordered
//! response back to the channel.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
