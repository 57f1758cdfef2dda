//! LLM provider abstraction for borsa-rs
//!
//! Defines the message and completion types, the [`LLMProvider`] trait the
//! orchestrator's agents talk to, the OpenRouter implementation, and the
//! structured-output parser that turns model text into typed values.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod structured;
pub mod tools;

pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, StopReason, TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;
