//! Model Context Protocol client for borsa-rs
//!
//! JSON-RPC 2.0 over HTTP access to the remote financial tool server. The
//! orchestrator only sees the [`MCPClient`] trait; the HTTP transport,
//! retries, and tool-catalog caching live here.

pub mod client;
pub mod error;
pub mod http;
pub mod retry;
pub mod summary;

pub use client::{
    ArcMCPClient, MCPClient, MCPContent, MCPServerInfo, MCPToolDefinition, MCPToolResult,
};
pub use error::{MCPError, Result};
pub use http::{DEFAULT_MCP_URL, HttpMCPClient};
pub use retry::RetryPolicy;
pub use summary::tools_summary;
