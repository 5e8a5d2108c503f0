//! HTTP analytics sink - pushes turn records to a REST collector.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use tracing::info;

use crate::config::RestLoggerConfig;
use crate::ports::{ConversationLogger, LogResult, LoggerError, TurnRecord};

pub struct RestLogger {
    client: reqwest::Client,
    url: String,
    api_token: Option<Secret<String>>,
}

impl RestLogger {
    pub fn new(config: &RestLoggerConfig) -> Result<Self, LoggerError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| LoggerError::Backend("collector url not configured".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_token: config.api_token.clone(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/api/v1/events", self.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ConversationLogger for RestLogger {
    async fn init(&self) -> Result<(), LoggerError> {
        info!(url = %self.url, "using REST analytics sink");
        Ok(())
    }

    async fn push(&self, record: TurnRecord) -> Result<LogResult, LoggerError> {
        let mut request = self.client.post(self.events_url()).json(&record);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request
            .send()
            .await
            .map_err(|e| LoggerError::Push(e.to_string()))?;
        if !response.status().is_success() {
            return Err(LoggerError::Push(format!(
                "collector returned status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| LoggerError::Push(e.to_string()))
    }
}

impl std::fmt::Debug for RestLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestLogger")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_normalizes_trailing_slash() {
        let logger = RestLogger::new(&RestLoggerConfig {
            url: Some("https://collector.example.com/".to_string()),
            api_token: None,
        })
        .unwrap();
        assert_eq!(logger.events_url(), "https://collector.example.com/api/v1/events");
    }

    #[test]
    fn test_missing_url_is_rejected() {
        assert!(RestLogger::new(&RestLoggerConfig::default()).is_err());
    }
}
