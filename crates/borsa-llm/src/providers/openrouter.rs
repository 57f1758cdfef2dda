//! OpenRouter provider implementation
//!
//! OpenRouter exposes an OpenAI-compatible chat-completions endpoint that
//! fronts many model families; the model string (e.g.
//! `google/gemini-2.5-flash`) selects the backend.
//! See: https://openrouter.ai/docs/api-reference/overview

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, MessageContent,
    Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenRouter provider
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: "https://openrouter.ai/api/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Value for the `HTTP-Referer` attribution header
    pub referer: Option<String>,

    /// Value for the `X-Title` attribution header
    pub title: Option<String>,
}

impl OpenRouterConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENROUTER_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            referer: None,
            title: None,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `OPENROUTER_API_KEY`; optionally reads the
    /// base URL from `OPENROUTER_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY").map_err(|_| {
            crate::LLMError::ConfigurationError(
                "OPENROUTER_API_KEY environment variable not set".to_string(),
            )
        })?;

        let api_base = std::env::var("OPENROUTER_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENROUTER_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            referer: None,
            title: None,
        })
    }

    /// Set a custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the `HTTP-Referer` attribution header
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Set the `X-Title` attribution header
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// OpenRouter provider
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenRouterConfig::new(api_key))
    }

    /// Create a provider from the `OPENROUTER_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenRouterConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenRouter at {}", self.config.api_base);

        let wire_messages = build_wire_messages(request.system.clone(), request.messages);
        let wire_tools = request.tools.as_ref().map(|tools| convert_tools(tools));

        let wire_request = WireRequest {
            model: request.model.clone(),
            messages: wire_messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: wire_tools,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter attribution headers, optional but recommended
        if let Some(referer) = &self.config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.json(&wire_request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 => crate::LLMError::AuthenticationFailed,
                429 => crate::LLMError::RateLimitExceeded(error_text),
                400 => crate::LLMError::InvalidRequest(error_text),
                404 => crate::LLMError::ModelNotFound(request.model),
                _ => crate::LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let wire_response: WireResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = wire_response.choices.into_iter().next().ok_or_else(|| {
            crate::LLMError::UnexpectedResponse("No choices in response".to_string())
        })?;

        debug!(
            "Received response - finish_reason: {}, tokens: {}/{}",
            choice.finish_reason,
            wire_response.usage.prompt_tokens,
            wire_response.usage.completion_tokens
        );

        let message = parse_wire_message(choice.message)?;
        let stop_reason = map_stop_reason(&choice.finish_reason);

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage {
                input_tokens: wire_response.usage.prompt_tokens,
                output_tokens: wire_response.usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}

// ============================================================================
// Wire request types (OpenAI-compatible schema)
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

// ============================================================================
// Wire response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireResponseToolCall {
    id: String,
    function: WireResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireResponseFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build wire messages from our generic format
///
/// The system prompt goes into the messages array (OpenAI convention), and
/// tool results become separate `role: "tool"` messages.
fn build_wire_messages(system: Option<String>, messages: Vec<Message>) -> Vec<WireMessage> {
    let mut result = Vec::new();

    if let Some(sys) = system {
        result.push(WireMessage {
            role: "system".to_string(),
            content: Some(sys),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for msg in messages {
        result.extend(convert_message(msg));
    }

    result
}

/// Convert a single message to wire format
///
/// One input message can yield several wire messages because tool results
/// are carried as standalone `tool` turns.
fn convert_message(msg: Message) -> Vec<WireMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    match msg.content {
        Some(MessageContent::Text(text)) => {
            vec![WireMessage {
                role: role.to_string(),
                content: Some(text),
                tool_calls: None,
                tool_call_id: None,
            }]
        }
        Some(MessageContent::Blocks(blocks)) => convert_blocks(role, blocks),
        None => {
            vec![WireMessage {
                role: role.to_string(),
                content: Some(String::new()),
                tool_calls: None,
                tool_call_id: None,
            }]
        }
    }
}

/// Convert content blocks to wire messages
fn convert_blocks(role: &str, blocks: Vec<ContentBlock>) -> Vec<WireMessage> {
    let mut messages = Vec::new();
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => {
                let arguments = serde_json::to_string(&input).unwrap_or_default();
                tool_calls.push(WireToolCall {
                    id,
                    tool_type: "function".to_string(),
                    function: WireFunctionCall { name, arguments },
                });
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => {
                messages.push(WireMessage {
                    role: "tool".to_string(),
                    content: Some(content),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id),
                });
            }
        }
    }

    if !texts.is_empty() || !tool_calls.is_empty() {
        messages.insert(
            0,
            WireMessage {
                role: role.to_string(),
                content: if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            },
        );
    }

    messages
}

/// Convert tool definitions to wire format
fn convert_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
    tools
        .iter()
        .map(|tool| WireTool {
            tool_type: "function".to_string(),
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

/// Parse a wire response message into our format
fn parse_wire_message(msg: WireResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content {
        if !content.is_empty() {
            blocks.push(ContentBlock::Text { text: content });
        }
    }

    if let Some(tool_calls) = msg.tool_calls {
        for call in tool_calls {
            let input: serde_json::Value =
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    crate::LLMError::UnexpectedResponse(format!(
                        "Failed to parse tool arguments: {e}"
                    ))
                })?;

            blocks.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.function.name,
                input,
            });
        }
    }

    if blocks.is_empty() {
        blocks.push(ContentBlock::Text {
            text: String::new(),
        });
    }

    Ok(Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    })
}

/// Map a finish reason string to our stop reason
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" => StopReason::ToolUse,
        _ => {
            debug!("Unknown finish reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenRouterProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openrouter");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_config_builders() {
        let config = OpenRouterConfig::new("test-key")
            .with_api_base("https://custom.api.com/v1")
            .with_timeout(60)
            .with_referer("https://github.com/borsa-rs/borsa-rs")
            .with_title("borsa-rs");

        assert_eq!(config.api_base, "https://custom.api.com/v1");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.title.as_deref(), Some("borsa-rs"));
    }

    #[test]
    fn test_simple_text_message_conversion() {
        let msgs = convert_message(Message::user("Merhaba"));
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
        assert_eq!(msgs[0].content.as_deref(), Some("Merhaba"));
    }

    #[test]
    fn test_system_message_in_array() {
        let msgs = build_wire_messages(Some("Sen bir asistansın".to_string()), vec![]);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "system");
    }

    #[test]
    fn test_tool_result_becomes_tool_turn() {
        let msg = Message::tool_result("call_1".to_string(), "fiyat: 42.5".to_string());
        let msgs = convert_message(msg);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "tool");
        assert_eq!(msgs[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_tool_definition_conversion() {
        let tool = ToolDefinition::new(
            "get_price",
            "Hisse fiyatı getirir",
            json!({"type": "object", "properties": {"ticker": {"type": "string"}}}),
        );

        let wire = convert_tools(&[tool]);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].tool_type, "function");
        assert_eq!(wire[0].function.name, "get_price");
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("tool_calls"), StopReason::ToolUse);
        assert_eq!(map_stop_reason("garbage"), StopReason::EndTurn);
    }

    #[test]
    fn test_parse_wire_message_with_tool_call() {
        let msg = WireResponseMessage {
            content: Some("Fiyatı kontrol ediyorum".to_string()),
            tool_calls: Some(vec![WireResponseToolCall {
                id: "call_1".to_string(),
                function: WireResponseFunctionCall {
                    name: "get_price".to_string(),
                    arguments: r#"{"ticker": "THYAO"}"#.to_string(),
                },
            }]),
        };

        let parsed = parse_wire_message(msg).unwrap();
        assert!(parsed.has_tool_uses());
        assert_eq!(parsed.text(), Some("Fiyatı kontrol ediyorum"));
    }

    #[test]
    fn test_parse_wire_message_bad_arguments() {
        let msg = WireResponseMessage {
            content: None,
            tool_calls: Some(vec![WireResponseToolCall {
                id: "call_1".to_string(),
                function: WireResponseFunctionCall {
                    name: "get_price".to_string(),
                    arguments: "not json".to_string(),
                },
            }]),
        };

        assert!(parse_wire_message(msg).is_err());
    }
}
