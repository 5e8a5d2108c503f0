//! Conversation analytics sinks.

mod postgres;
mod rest;

pub use postgres::PostgresLogger;
pub use rest::RestLogger;
