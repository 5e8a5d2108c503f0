//! Adapters - concrete implementations of the ports, plus the HTTP
//! ingress.

pub mod bots;
pub mod http;
pub mod logger;
pub mod nlu;
pub mod session;
pub mod transport;
