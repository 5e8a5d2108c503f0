//! Channel transport configuration

use secrecy::Secret;
use serde::Deserialize;

use super::error::ValidationError;

/// Outbound reply delivery configuration
#[derive(Debug, Default, Deserialize)]
pub struct TransportConfig {
    /// Webhook URL replies are POSTed to
    #[serde(default)]
    pub reply_url: Option<String>,

    #[serde(default)]
    pub api_token: Option<Secret<String>>,
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self
            .reply_url
            .as_deref()
            .ok_or(ValidationError::MissingRequired("TRANSPORT_REPLY_URL"))?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidServiceUrl("TRANSPORT_REPLY_URL"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_url_required() {
        assert!(TransportConfig::default().validate().is_err());
    }

    #[test]
    fn test_valid_url() {
        let config = TransportConfig {
            reply_url: Some("https://channel.example.com/replies".to_string()),
            api_token: None,
        };
        assert!(config.validate().is_ok());
    }
}
