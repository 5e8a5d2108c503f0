//! NLU service configuration

use secrecy::Secret;
use serde::Deserialize;

use super::error::ValidationError;

/// Primary NLU (assistant) service configuration
#[derive(Debug, Deserialize, Default)]
pub struct NluConfig {
    /// Whether the orchestrator consults an NLU service at all
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub service_url: Option<String>,

    #[serde(default)]
    pub assistant_id: Option<String>,

    /// Assistant API version date
    #[serde(default = "default_version")]
    pub version: String,

    /// Stable user id reported to the assistant for billing/analytics
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub api_key: Option<Secret<String>>,
}

impl NluConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        let url = self
            .service_url
            .as_deref()
            .ok_or(ValidationError::MissingRequired("NLU_SERVICE_URL"))?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidServiceUrl("NLU_SERVICE_URL"));
        }
        if self.assistant_id.is_none() {
            return Err(ValidationError::MissingRequired("NLU_ASSISTANT_ID"));
        }
        if self.api_key.is_none() {
            return Err(ValidationError::MissingRequired("NLU_API_KEY"));
        }
        Ok(())
    }
}

fn default_version() -> String {
    "2021-11-27".to_string()
}
