//! Symptom Analyzer
//!
//! prompt -> model -> parser for a single inventory item. Failures are
//! absorbed here: the item is reported at level 0 with the error as its
//! explanation and `assessed = false`.

use crate::catalog::SymptomDescriptor;
use crate::llm_client::LlmClient;
use crate::parser::parse_response;
use crate::prompt::build_prompt;
use crate::types::SymptomResult;
use std::time::Instant;

pub struct SymptomAnalyzer<'a> {
    client: &'a dyn LlmClient,
}

impl<'a> SymptomAnalyzer<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self { client }
    }

    pub fn analyze(&self, symptom: &SymptomDescriptor, user_text: &str) -> SymptomResult {
        let started = Instant::now();
        let prompt = build_prompt(symptom.question, user_text);

        let response = match self.client.generate(&prompt) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(symptom = symptom.id, error = %e, "symptom not assessed");
                return SymptomResult::unassessed(symptom, format!("Error analyzing symptom: {}", e));
            }
        };

        let parsed = parse_response(&response, &prompt);
        tracing::debug!(
            symptom = symptom.id,
            level = parsed.level.value(),
            source = ?parsed.source,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "symptom analyzed"
        );

        if parsed.assessed {
            SymptomResult::assessed(symptom, parsed.level, parsed.explanation)
        } else {
            SymptomResult::unassessed(symptom, parsed.explanation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BDI_SYMPTOMS;
    use crate::error::InferenceError;
    use crate::llm_client::FakeLlmClient;
    use crate::types::Level;

    #[test]
    fn test_analyze_success() {
        let client = FakeLlmClient::always("Level (0, 1, 2 or 3): 3\nThe user cries every day.");
        let result = SymptomAnalyzer::new(&client).analyze(&BDI_SYMPTOMS[9], "I cry all the time");

        assert_eq!(result.id, "Q10");
        assert_eq!(result.question, "how often the user cries");
        assert_eq!(result.level, Level::Severe);
        assert!(result.assessed);
        assert!(result.explanation.contains("cries every day"));
    }

    #[test]
    fn test_prompt_carries_question_and_text() {
        let client = FakeLlmClient::always("0");
        SymptomAnalyzer::new(&client).analyze(&BDI_SYMPTOMS[0], "A quiet week.");

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("how sad the user feels"));
        assert!(prompts[0].contains("A quiet week."));
    }

    #[test]
    fn test_inference_failure_becomes_level_zero() {
        let client = FakeLlmClient::always_error(InferenceError::Unavailable(
            "connection refused".to_string(),
        ));
        let result = SymptomAnalyzer::new(&client).analyze(&BDI_SYMPTOMS[0], "text");

        assert_eq!(result.level, Level::Minimal);
        assert!(!result.assessed);
        assert!(result.explanation.starts_with("Error analyzing symptom:"));
        assert!(result.explanation.contains("connection refused"));
    }
}
