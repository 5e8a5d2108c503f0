//! Secondary backend (bot adapter) configuration

use secrecy::Secret;
use serde::Deserialize;

use super::error::ValidationError;

/// Echo test-double backend
#[derive(Debug, Deserialize)]
pub struct EchoBotConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_echo_name")]
    pub name: String,

    #[serde(default = "default_echo_skills")]
    pub skills: Vec<String>,
}

impl Default for EchoBotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: default_echo_name(),
            skills: default_echo_skills(),
        }
    }
}

/// QnA-style knowledge-base lookup backend
#[derive(Debug, Default, Deserialize)]
pub struct QnaBotConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_qna_name")]
    pub name: String,

    #[serde(default)]
    pub skills: Vec<String>,

    /// Answer-lookup endpoint base URL
    #[serde(default)]
    pub runtime_endpoint: Option<String>,

    /// Authoring endpoint base URL, used only to bootstrap a default
    /// knowledge base when no id is configured
    #[serde(default)]
    pub authoring_endpoint: Option<String>,

    #[serde(default)]
    pub knowledge_base_id: Option<String>,

    #[serde(default)]
    pub endpoint_key: Option<Secret<String>>,

    #[serde(default)]
    pub subscription_key: Option<Secret<String>>,

    /// Answers scoring below this fraction mark the turn low confidence
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

/// Ticketing/dialog backend with asynchronous HTTP callbacks
#[derive(Debug, Default, Deserialize)]
pub struct HelpdeskBotConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_helpdesk_name")]
    pub name: String,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub service_url: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub user_password: Option<Secret<String>>,

    #[serde(default)]
    pub api_token: Option<Secret<String>>,

    /// The backend reports score 0 on low confidence, 1 otherwise
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

/// Dialog-tree engine backend (assistant-backed)
#[derive(Debug, Default, Deserialize)]
pub struct DialogBotConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_dialog_name")]
    pub name: String,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub service_url: Option<String>,

    #[serde(default)]
    pub assistant_id: Option<String>,

    #[serde(default = "default_dialog_version")]
    pub version: String,

    #[serde(default)]
    pub api_key: Option<Secret<String>>,

    /// Low confidence when every classified intent scores below this
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

/// All secondary backends
#[derive(Debug, Default, Deserialize)]
pub struct BotsConfig {
    #[serde(default)]
    pub echo: EchoBotConfig,

    #[serde(default)]
    pub qna: QnaBotConfig,

    #[serde(default)]
    pub helpdesk: HelpdeskBotConfig,

    #[serde(default)]
    pub dialog: DialogBotConfig,
}

impl BotsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.qna.enabled {
            if self.qna.skills.is_empty() {
                return Err(ValidationError::NoSkillsDeclared("BOTS_QNA_SKILLS"));
            }
            if self.qna.runtime_endpoint.is_none() {
                return Err(ValidationError::MissingRequired("BOTS_QNA_RUNTIME_ENDPOINT"));
            }
            if self.qna.endpoint_key.is_none() {
                return Err(ValidationError::MissingRequired("BOTS_QNA_ENDPOINT_KEY"));
            }
            if self.qna.knowledge_base_id.is_none()
                && (self.qna.authoring_endpoint.is_none() || self.qna.subscription_key.is_none())
            {
                return Err(ValidationError::MissingRequired(
                    "BOTS_QNA_KNOWLEDGE_BASE_ID",
                ));
            }
            check_threshold(self.qna.confidence_threshold)?;
        }
        if self.helpdesk.enabled {
            if self.helpdesk.skills.is_empty() {
                return Err(ValidationError::NoSkillsDeclared("BOTS_HELPDESK_SKILLS"));
            }
            if self.helpdesk.service_url.is_none() {
                return Err(ValidationError::MissingRequired(
                    "BOTS_HELPDESK_SERVICE_URL",
                ));
            }
            check_threshold(self.helpdesk.confidence_threshold)?;
        }
        if self.dialog.enabled {
            if self.dialog.skills.is_empty() {
                return Err(ValidationError::NoSkillsDeclared("BOTS_DIALOG_SKILLS"));
            }
            if self.dialog.service_url.is_none() {
                return Err(ValidationError::MissingRequired("BOTS_DIALOG_SERVICE_URL"));
            }
            if self.dialog.assistant_id.is_none() {
                return Err(ValidationError::MissingRequired("BOTS_DIALOG_ASSISTANT_ID"));
            }
            if self.dialog.api_key.is_none() {
                return Err(ValidationError::MissingRequired("BOTS_DIALOG_API_KEY"));
            }
            check_threshold(self.dialog.confidence_threshold)?;
        }
        Ok(())
    }
}

fn check_threshold(value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidConfidenceThreshold);
    }
    Ok(())
}

fn default_echo_name() -> String {
    "EchoBot".to_string()
}

fn default_echo_skills() -> Vec<String> {
    vec!["DEFAULT".to_string()]
}

fn default_qna_name() -> String {
    "QnABot".to_string()
}

fn default_helpdesk_name() -> String {
    "HelpdeskBot".to_string()
}

fn default_dialog_name() -> String {
    "DialogBot".to_string()
}

fn default_dialog_version() -> String {
    "2021-11-27".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.5
}
