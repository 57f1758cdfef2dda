//! HTTP transport MCP client
//!
//! Communicates with the remote financial tool server via HTTP POST using
//! the JSON-RPC 2.0 protocol: initialize handshake, tools/list, tools/call.

use crate::client::{MCPClient, MCPServerInfo, MCPToolDefinition, MCPToolResult};
use crate::error::MCPError;
use crate::retry::RetryPolicy;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default public endpoint of the Borsa tool server
pub const DEFAULT_MCP_URL: &str = "https://borsamcp.fastmcp.app/mcp";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// MCP client over HTTP
///
/// One instance is shared by every task in a session; the tool catalog is
/// fetched once at connect time and served from cache afterwards.
pub struct HttpMCPClient {
    url: String,

    /// HTTP client
    http_client: reqwest::Client,

    /// Server info from initialization
    server_info: Arc<Mutex<Option<MCPServerInfo>>>,

    /// Connection state
    connected: Arc<Mutex<bool>>,

    /// Request ID counter
    request_id: Arc<Mutex<u64>>,

    /// Tool catalog cached at connect time
    tools_cache: Arc<Mutex<Vec<MCPToolDefinition>>>,

    /// Retry policy for connection and requests
    retry_policy: RetryPolicy,
}

impl HttpMCPClient {
    /// Create a new HTTP MCP client
    ///
    /// # Arguments
    ///
    /// * `url` - Server URL
    /// * `timeout` - Request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MCPError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http_client,
            server_info: Arc::new(Mutex::new(None)),
            connected: Arc::new(Mutex::new(false)),
            request_id: Arc::new(Mutex::new(0)),
            tools_cache: Arc::new(Mutex::new(Vec::new())),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Create a client for the default Borsa endpoint
    ///
    /// Honors the `BORSA_MCP_URL` environment variable when set.
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("BORSA_MCP_URL").unwrap_or_else(|_| DEFAULT_MCP_URL.to_string());
        Self::new(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Set a custom retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Server URL this client talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get next request ID
    async fn next_request_id(&self) -> u64 {
        let mut id = self.request_id.lock().await;
        *id += 1;
        *id
    }

    /// Send a JSON-RPC request over HTTP
    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_request_id().await;

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        debug!("Sending HTTP request to {}: {}", self.url, method);

        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MCPError::ConnectionFailed(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MCPError::RequestFailed(format!(
                "HTTP {} for {}: {}",
                response.status(),
                method,
                response.text().await.unwrap_or_default()
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| MCPError::RequestFailed(format!("Failed to parse response: {e}")))?;

        debug!("Received response for: {}", method);

        // Check for JSON-RPC error
        if let Some(error) = response_json.get("error") {
            return Err(MCPError::RequestFailed(format!("{method}: {error}")));
        }

        response_json
            .get("result")
            .cloned()
            .ok_or_else(|| MCPError::RequestFailed("No result in response".to_string()))
    }

    /// Send initialize request
    async fn initialize(&self) -> Result<MCPServerInfo> {
        let params = serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "clientInfo": {
                "name": "borsa-rs",
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let result = self.send_request("initialize", params).await?;

        let server_info = MCPServerInfo {
            name: result["serverInfo"]["name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            version: result["serverInfo"]["version"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            protocol_version: result["protocolVersion"]
                .as_str()
                .unwrap_or("2024-11-05")
                .to_string(),
        };

        info!(
            "Connected to MCP server: {} v{}",
            server_info.name, server_info.version
        );

        // Send initialized notification (fire and forget)
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });

        let _ = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&notification)
            .send()
            .await;

        Ok(server_info)
    }

    /// Fetch the tool catalog from the server
    async fn fetch_tools(&self) -> Result<Vec<MCPToolDefinition>> {
        let result = self
            .send_request("tools/list", serde_json::json!({}))
            .await?;

        let tools: Vec<MCPToolDefinition> = serde_json::from_value(result["tools"].clone())
            .map_err(|e| MCPError::RequestFailed(format!("Failed to parse tools: {e}")))?;

        Ok(tools)
    }
}

#[async_trait]
impl MCPClient for HttpMCPClient {
    async fn connect(&self) -> Result<()> {
        debug!("Connecting to MCP server: {}", self.url);

        let server_info = self
            .retry_policy
            .execute(&format!("connect to {}", self.url), || async {
                self.initialize().await
            })
            .await?;

        *self.server_info.lock().await = Some(server_info);
        *self.connected.lock().await = true;

        // Warm the tool catalog so every later list_tools is a cache hit
        let tools = self
            .retry_policy
            .execute("tools/list", || async { self.fetch_tools().await })
            .await?;

        info!("Tool catalog loaded: {} tools", tools.len());
        *self.tools_cache.lock().await = tools;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        // Non-blocking check using try_lock
        self.connected
            .try_lock()
            .map(|guard| *guard)
            .unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<()> {
        debug!("Disconnecting from MCP server");
        *self.connected.lock().await = false;
        self.tools_cache.lock().await.clear();
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<MCPToolDefinition>> {
        if !self.is_connected() {
            return Err(MCPError::NotConnected);
        }

        let cached = self.tools_cache.lock().await;
        if !cached.is_empty() {
            return Ok(cached.clone());
        }
        drop(cached);

        let tools = self.fetch_tools().await?;
        *self.tools_cache.lock().await = tools.clone();
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<MCPToolResult> {
        if !self.is_connected() {
            return Err(MCPError::NotConnected);
        }

        let params = serde_json::json!({
            "name": name,
            "arguments": arguments
        });

        let result = self.send_request("tools/call", params).await?;

        let tool_result: MCPToolResult = serde_json::from_value(result)
            .map_err(|e| MCPError::ToolCallFailed(format!("Failed to parse result: {e}")))?;

        Ok(tool_result)
    }

    async fn server_info(&self) -> Option<MCPServerInfo> {
        self.server_info.lock().await.clone()
    }
}
