//! Query routing agent
//!
//! First stage of every run: decides whether the query can be answered
//! directly, needs the planning pipeline, or asks for a valuation
//! analysis.

use std::sync::Arc;

use borsa_core::{Result, RouteDecision, UsageTracker};
use borsa_llm::{CompletionRequest, LLMProvider, Message, structured};
use tracing::debug;

pub struct Router {
    provider: Arc<dyn LLMProvider>,
    model: String,
    system_prompt: String,
}

impl Router {
    pub fn new(provider: Arc<dyn LLMProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
        }
    }

    /// Classify the query against the conversation so far.
    pub async fn route(
        &self,
        query: &str,
        history: &[Message],
        usage: &UsageTracker,
    ) -> Result<RouteDecision> {
        let mut messages = history.to_vec();
        messages.push(Message::user(query));

        let request = CompletionRequest::builder(&self.model)
            .messages(messages)
            .system(&self.system_prompt)
            .max_tokens(1024)
            .temperature(0.2)
            .build();

        let response = super::complete(self.provider.as_ref(), request, usage).await?;
        let decision: RouteDecision = structured::parse_json(&response.message.full_text())?;
        debug!(
            is_simple = decision.is_simple,
            confidence = decision.confidence,
            valuation = decision.valuation,
            "Routing decision"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::MockProvider;

    #[tokio::test]
    async fn parses_routing_json() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": true, "confidence": 0.92, "answer": "F/K oranı fiyat/kazanç oranıdır.", "reasoning": "tanım sorusu"}"#,
        );
        let router = Router::new(provider.clone(), "m".into(), "sys".into());
        let usage = UsageTracker::new();
        let decision = router.route("F/K nedir?", &[], &usage).await.unwrap();
        assert!(decision.takes_simple_path());
        assert!(!decision.valuation);
        assert_eq!(provider.calls(), 1);
        assert_eq!(usage.snapshot().requests, 1);
    }

    #[tokio::test]
    async fn fenced_json_is_accepted() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            "```json\n{\"is_simple\": false, \"confidence\": 0.8, \"answer\": null, \"reasoning\": \"veri gerekli\", \"valuation\": true}\n```",
        );
        let router = Router::new(provider, "m".into(), "sys".into());
        let decision = router
            .route("THYAO değerleme analizi", &[], &UsageTracker::new())
            .await
            .unwrap();
        assert!(!decision.is_simple);
        assert!(decision.valuation);
    }
}
