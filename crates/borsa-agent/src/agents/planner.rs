//! Task planning agent

use std::sync::Arc;

use borsa_core::{Result, TaskList, UsageTracker};
use borsa_llm::{CompletionRequest, LLMProvider, Message, structured};
use tracing::debug;

/// Decomposes a query into a dependency-annotated task list.
///
/// An empty task list is a valid plan: it means the question can be
/// answered from conversation context without new data.
pub struct Planner {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl Planner {
    pub fn new(provider: Arc<dyn LLMProvider>, model: String) -> Self {
        Self { provider, model }
    }

    /// Plan the query. The system prompt is rendered per call because it
    /// embeds the live tool catalog.
    pub async fn plan(
        &self,
        query: &str,
        history: &[Message],
        system_prompt: &str,
        usage: &UsageTracker,
    ) -> Result<TaskList> {
        let mut messages = history.to_vec();
        messages.push(Message::user(query));

        let request = CompletionRequest::builder(&self.model)
            .messages(messages)
            .system(system_prompt)
            .max_tokens(2048)
            .temperature(0.2)
            .build();

        let response = super::complete(self.provider.as_ref(), request, usage).await?;
        let task_list: TaskList = structured::parse_json(&response.message.full_text())?;
        debug!(tasks = task_list.tasks.len(), "Plan created");
        Ok(task_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::MockProvider;

    #[tokio::test]
    async fn parses_task_list_with_dependencies() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"tasks": [{"id": 1, "description": "THYAO fiyatını getir", "tool_name": "hisse_fiyati"}, {"id": 2, "description": "Fiyatı yorumla", "depends_on": [1]}], "reasoning": "iki adım"}"#,
        );
        let planner = Planner::new(provider, "m".into());
        let plan = planner
            .plan("THYAO nasıl gidiyor?", &[], "sys", &UsageTracker::new())
            .await
            .unwrap();
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[1].depends_on, vec![1]);
    }

    #[tokio::test]
    async fn follow_up_yields_empty_plan() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(r#"{"tasks": [], "reasoning": "takip sorusu, veri mevcut"}"#);
        let planner = Planner::new(provider, "m".into());
        let plan = planner
            .plan("Peki bu iyi mi?", &[], "sys", &UsageTracker::new())
            .await
            .unwrap();
        assert!(plan.is_empty());
    }
}
