//! Answer synthesis agent

use std::sync::Arc;

use borsa_core::{Answer, Result, UsageTracker};
use borsa_llm::{CompletionRequest, LLMProvider, Message, structured};
use tracing::{debug, warn};

use crate::prompts;

/// Turns collected task outputs into the final Turkish answer.
pub struct Synthesizer {
    provider: Arc<dyn LLMProvider>,
    model: String,
    system_prompt: String,
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn LLMProvider>, model: String, system_prompt: String) -> Self {
        Self {
            provider,
            model,
            system_prompt,
        }
    }

    pub async fn synthesize(
        &self,
        query: &str,
        outputs: &[String],
        usage: &UsageTracker,
    ) -> Result<Answer> {
        let request = CompletionRequest::builder(&self.model)
            .messages(vec![Message::user(prompts::answer_user(query, outputs))])
            .system(&self.system_prompt)
            .max_tokens(4096)
            .temperature(0.4)
            .build();

        let response = super::complete(self.provider.as_ref(), request, usage).await?;
        let text = response.message.full_text();

        // A malformed envelope still carries a usable answer: fall back to
        // the raw text instead of failing the whole run.
        match structured::parse_json::<Answer>(&text) {
            Ok(answer) => {
                debug!(confidence = answer.confidence, "Answer synthesized");
                Ok(answer)
            }
            Err(e) => {
                warn!(error = %e, "Answer envelope malformed, using raw text");
                Ok(Answer {
                    answer: text,
                    confidence: 0.5,
                    data_sources: Vec::new(),
                    warnings: Vec::new(),
                })
            }
        }
    }
}
