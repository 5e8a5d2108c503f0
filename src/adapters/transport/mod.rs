//! Channel transport adapters: webhook delivery and an in-memory recorder
//! for tests.

mod recording;
mod webhook;

pub use recording::RecordingTransport;
pub use webhook::WebhookTransport;
