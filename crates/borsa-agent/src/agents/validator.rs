//! Task completion validator

use std::sync::Arc;

use borsa_core::{IsDone, Result, UsageTracker};
use borsa_llm::{CompletionRequest, LLMProvider, Message, structured};
use tracing::debug;

use crate::prompts;

/// Judges whether a task's accumulated outputs satisfy its description.
pub struct Validator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    system_prompt: String,
}

impl Validator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
        }
    }

    pub async fn validate(
        &self,
        task_description: &str,
        outputs: &[String],
        usage: &UsageTracker,
    ) -> Result<IsDone> {
        let request = CompletionRequest::builder(&self.model)
            .messages(vec![Message::user(prompts::validation_user(
                task_description,
                outputs,
            ))])
            .system(&self.system_prompt)
            .max_tokens(512)
            .temperature(0.1)
            .build();

        let response = super::complete(self.provider.as_ref(), request, usage).await?;
        let verdict: IsDone = structured::parse_json(&response.message.full_text())?;
        debug!(
            done = verdict.done,
            confidence = verdict.confidence,
            "Validation verdict"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::MockProvider;

    #[tokio::test]
    async fn parses_verdict() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(r#"{"done": true, "reason": "veri mevcut", "confidence": 0.9}"#);
        let validator = Validator::new(provider, "m".into(), "sys".into());
        let verdict = validator
            .validate("fiyatı getir", &["320,50 TL".to_string()], &UsageTracker::new())
            .await
            .unwrap();
        assert!(verdict.done);
        assert!((verdict.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let provider = Arc::new(MockProvider::new());
        provider.push_error("bağlantı hatası");
        let validator = Validator::new(provider, "m".into(), "sys".into());
        let result = validator
            .validate("görev", &[], &UsageTracker::new())
            .await;
        assert!(result.is_err());
    }
}
