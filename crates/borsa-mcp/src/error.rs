//! Error types for MCP operations

use thiserror::Error;

/// Result type for MCP operations
pub type Result<T> = std::result::Result<T, MCPError>;

/// Errors that can occur during MCP operations
#[derive(Error, Debug)]
pub enum MCPError {
    /// MCP connection failed
    #[error("MCP connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected to MCP server
    #[error("Not connected to MCP server")]
    NotConnected,

    /// MCP request failed
    #[error("MCP request failed: {0}")]
    RequestFailed(String),

    /// MCP tool call failed
    #[error("MCP tool call failed: {0}")]
    ToolCallFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl MCPError {
    /// Whether a fresh attempt against the server could succeed.
    ///
    /// Network-level failures are transient: the public Borsa endpoint
    /// drops connections under load and recovers within seconds. A tool
    /// call the server itself rejected, or anything wrong on our side
    /// (config, JSON shape), will fail the same way on replay.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::NotConnected => true,
            Self::ToolCallFailed(_)
            | Self::ConfigError(_)
            | Self::InternalError(_)
            | Self::JsonError(_) => false,
        }
    }
}

/// Convert MCPError to borsa_core::Error
impl From<MCPError> for borsa_core::Error {
    fn from(err: MCPError) -> Self {
        borsa_core::Error::ProcessingFailed(err.to_string())
    }
}
