//! MCP client trait and wire types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::Result;

/// MCP client trait - abstracts over the transport
///
/// Note: All methods use &self (not &mut self) to enable use through Arc.
/// Implementations use interior mutability for state changes, since one
/// client is shared by every parallel task in a session.
#[async_trait]
pub trait MCPClient: Send + Sync {
    /// Initialize connection to the MCP server
    async fn connect(&self) -> Result<()>;

    /// Check if client is connected
    fn is_connected(&self) -> bool;

    /// Disconnect from the server
    async fn disconnect(&self) -> Result<()>;

    /// List available tools
    async fn list_tools(&self) -> Result<Vec<MCPToolDefinition>>;

    /// Call a tool by name
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<MCPToolResult>;

    /// Get server info (from initialize response)
    async fn server_info(&self) -> Option<MCPServerInfo>;
}

/// MCP tool definition (from tools/list)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value, // JSON Schema
}

/// MCP tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPToolResult {
    pub content: Vec<MCPContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "isError")]
    pub is_error: Option<bool>,
}

impl MCPToolResult {
    /// All text content joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                MCPContent::Text { text } => Some(text.as_str()),
                MCPContent::Resource { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the server flagged this result as an error
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// MCP content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MCPContent {
    Text {
        text: String,
    },
    Resource {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
        mime_type: Option<String>,
    },
}

/// MCP server info (from initialize)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPServerInfo {
    pub name: String,
    pub version: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

/// Type alias for Arc-wrapped MCP client
pub type ArcMCPClient = Arc<dyn MCPClient>;
