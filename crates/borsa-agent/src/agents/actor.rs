//! Tool-calling action agent
//!
//! Runs the inner agent loop for one prompt: call the model with the MCP
//! tool catalog, execute any requested tools against the MCP server, feed
//! the results back, and repeat until the model stops asking for tools.

use std::collections::HashMap;
use std::sync::Arc;

use borsa_core::{Result, UsageTracker};
use borsa_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, ToolDefinition,
};
use borsa_mcp::ArcMCPClient;
use tracing::{debug, info, warn};

/// Cap on model/tool round trips within a single act call.
const MAX_TOOL_ROUNDS: usize = 8;

pub struct Actor {
    provider: Arc<dyn LLMProvider>,
    mcp: ArcMCPClient,
    model: String,
    system_prompt: String,
    /// Optional Turkish progress line per tool name, shown while it runs.
    progress_messages: HashMap<String, String>,
}

impl Actor {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        mcp: ArcMCPClient,
        model: String,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            mcp,
            model,
            system_prompt,
            progress_messages: HashMap::new(),
        }
    }

    pub fn with_progress_messages(mut self, messages: HashMap<String, String>) -> Self {
        self.progress_messages = messages;
        self
    }

    /// Run one act iteration: prompt in, final text out.
    pub async fn act(&self, prompt: &str, usage: &UsageTracker) -> Result<String> {
        let tools = self.tool_definitions().await?;
        let mut conversation = vec![Message::user(prompt)];

        for round in 0..MAX_TOOL_ROUNDS {
            let mut builder = CompletionRequest::builder(&self.model)
                .messages(conversation.clone())
                .system(&self.system_prompt)
                .max_tokens(8192)
                .temperature(0.3);
            if !tools.is_empty() {
                builder = builder.tools(tools.clone());
            }

            let response =
                super::complete(self.provider.as_ref(), builder.build(), usage).await?;
            debug!(round, stop_reason = ?response.stop_reason, "Act round completed");
            conversation.push(response.message.clone());

            if response.stop_reason != StopReason::ToolUse {
                return Ok(response.message.full_text());
            }

            for block in response.message.tool_uses() {
                if let ContentBlock::ToolUse { id, name, input } = block {
                    if let Some(line) = self.progress_messages.get(name) {
                        info!("{line}");
                    }
                    debug!(tool = %name, "Calling MCP tool");
                    let result_message = match self.mcp.call_tool(name, input.clone()).await {
                        Ok(result) if result.is_error() => {
                            Message::tool_error(id.clone(), result.text())
                        }
                        Ok(result) => Message::tool_result(id.clone(), result.text()),
                        Err(e) => {
                            warn!(tool = %name, error = %e, "Tool call failed");
                            Message::tool_error(id.clone(), format!("Araç çağrısı başarısız: {e}"))
                        }
                    };
                    conversation.push(result_message);
                }
            }
        }

        warn!(max_rounds = MAX_TOOL_ROUNDS, "Tool round cap reached");
        Ok(conversation
            .iter()
            .rev()
            .find_map(|m| {
                let text = m.full_text();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| "Araç döngüsü sınırına ulaşıldı".to_string()))
    }

    async fn tool_definitions(&self) -> Result<Vec<ToolDefinition>> {
        let tools = self.mcp.list_tools().await.map_err(borsa_core::Error::from)?;
        Ok(tools
            .into_iter()
            .map(|t| {
                ToolDefinition::new(
                    t.name,
                    t.description.unwrap_or_default(),
                    t.input_schema,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{MockMCP, MockProvider};
    use serde_json::json;

    #[tokio::test]
    async fn plain_answer_returns_without_tools() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text("THYAO kapanışı 320,50 TL");
        let mcp = Arc::new(MockMCP::new());
        let actor = Actor::new(provider, mcp.clone(), "m".into(), "sys".into());
        let output = actor
            .act("Görev: fiyatı getir", &UsageTracker::new())
            .await
            .unwrap();
        assert_eq!(output, "THYAO kapanışı 320,50 TL");
        assert!(mcp.called.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_use_round_trips_through_mcp() {
        let provider = Arc::new(MockProvider::new());
        provider.push_tool_use("call-1", "hisse_fiyati", json!({"sembol": "THYAO"}));
        provider.push_text("Fiyat 320,50 TL olarak alındı");
        let mcp = Arc::new(MockMCP::new());
        mcp.push_result("320,50");
        let actor = Actor::new(provider.clone(), mcp.clone(), "m".into(), "sys".into());
        let output = actor
            .act("Görev: fiyatı getir", &UsageTracker::new())
            .await
            .unwrap();
        assert_eq!(output, "Fiyat 320,50 TL olarak alındı");
        assert_eq!(provider.calls(), 2);
        let called = mcp.called.lock().unwrap();
        assert_eq!(called.len(), 1);
        assert_eq!(called[0].0, "hisse_fiyati");
    }

    #[tokio::test]
    async fn failed_tool_call_feeds_error_back() {
        let provider = Arc::new(MockProvider::new());
        provider.push_tool_use("call-1", "bilinmeyen_arac", json!({}));
        provider.push_text("Araç çalışmadı, elimdeki bilgiyle cevap veriyorum");
        let mcp = Arc::new(MockMCP::new());
        mcp.results.lock().unwrap().push_back(Err(
            borsa_mcp::MCPError::ToolCallFailed("araç bulunamadı".to_string()),
        ));
        let actor = Actor::new(provider, mcp, "m".into(), "sys".into());
        let output = actor.act("Görev", &UsageTracker::new()).await.unwrap();
        assert!(output.contains("cevap veriyorum"));
    }
}
