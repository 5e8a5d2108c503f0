//! Result shape produced by the primary NLU classification service.

use serde::{Deserialize, Serialize};

use super::response::OrchestratorResponse;
use super::session::Entity;

/// One ranked classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluClass {
    pub class_name: String,
    pub confidence: f64,
}

/// Classification outcome for one utterance, including any disambiguation
/// prompts the NLU layer already rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluResult {
    pub text: String,

    /// Name of the backend skill to hand the turn off to, if declared.
    pub skill_transfer: Option<String>,

    pub top_class: String,
    pub classes: Vec<NluClass>,
    pub entities: Vec<Entity>,

    /// Messages already rendered by the NLU layer (e.g. disambiguation
    /// prompts), in declared order.
    pub response: Vec<OrchestratorResponse>,
}

impl NluResult {
    /// A response with no rendered messages, or containing a text message
    /// with an empty body, is treated as empty and never sent.
    pub fn is_empty_response(&self) -> bool {
        self.response.is_empty() || self.response.iter().any(OrchestratorResponse::is_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(response: Vec<OrchestratorResponse>) -> NluResult {
        NluResult {
            text: "hi".to_string(),
            skill_transfer: None,
            top_class: "DEFAULT".to_string(),
            classes: vec![],
            entities: vec![],
            response,
        }
    }

    #[test]
    fn test_no_messages_is_empty() {
        assert!(result_with(vec![]).is_empty_response());
    }

    #[test]
    fn test_blank_text_message_is_empty() {
        let result = result_with(vec![
            OrchestratorResponse::text("something"),
            OrchestratorResponse::text(""),
        ]);
        assert!(result.is_empty_response());
    }

    #[test]
    fn test_rendered_prompt_is_not_empty() {
        let result = result_with(vec![OrchestratorResponse::text("Did you mean...?")]);
        assert!(!result.is_empty_response());
    }
}
