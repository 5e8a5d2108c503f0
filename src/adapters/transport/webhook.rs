//! Webhook channel transport.
//!
//! Delivers canonical outbound messages by POSTing them to the channel
//! layer's reply endpoint, one request per message so callers control
//! ordering by awaiting each send.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::config::TransportConfig;
use crate::domain::OrchestratorResponse;
use crate::ports::{ChannelTransport, TransportError};

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    conversation_id: &'a str,
    message: &'a OrchestratorResponse,
}

/// HTTP reply delivery to the channel layer.
pub struct WebhookTransport {
    client: reqwest::Client,
    reply_url: String,
    api_token: Option<Secret<String>>,
}

impl WebhookTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let reply_url = config
            .reply_url
            .clone()
            .ok_or_else(|| TransportError::Send("reply url not configured".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            reply_url,
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl ChannelTransport for WebhookTransport {
    async fn send(
        &self,
        conversation_id: &str,
        message: &OrchestratorResponse,
    ) -> Result<(), TransportError> {
        let envelope = OutboundEnvelope {
            conversation_id,
            message,
        };
        let mut request = self.client.post(&self.reply_url).json(&envelope);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TransportError::Send(format!(
                "channel endpoint returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookTransport")
            .field("reply_url", &self.reply_url)
            .finish_non_exhaustive()
    }
}
