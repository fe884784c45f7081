//! MCP client: manages the one server connection.
//!
//! Wraps the transport with the MCP lifecycle: handshake on start, tool
//! discovery (tools/list), tool invocation (tools/call) and shutdown.

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::handshake::{ServerInfo, handshake};
use crate::process::ShutdownOutcome;
use crate::tool::{ToolDescriptor, interpret_tool_response, parse_tools_list};
use crate::transport::StdioTransport;
use rvr_types::ToolExecutor;
use std::future::Future;
use std::pin::Pin;

/// Client for the robot's MCP server.
pub struct McpClient {
    transport: StdioTransport,
    server_info: ServerInfo,
}

impl McpClient {
    /// Spawn the server and run the handshake.
    ///
    /// If the handshake fails the process is stopped before returning the
    /// error; the caller should treat this as fatal.
    pub async fn start(name: impl Into<String>, config: &McpServerConfig) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(name, config)?;

        match handshake(&transport).await {
            Ok(server_info) => Ok(Self {
                transport,
                server_info,
            }),
            Err(e) => {
                tracing::warn!(server = %transport.name(), "handshake failed: {e}");
                transport.shutdown().await;
                Err(e)
            }
        }
    }

    pub fn name(&self) -> &str {
        self.transport.name()
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub async fn is_running(&self) -> bool {
        self.transport.is_running().await
    }

    /// Fetch the server's tool catalog.
    ///
    /// An error response or a missing `result` yields an empty list; transport
    /// failures (timeout, closed connection) are returned.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let resp = self
            .transport
            .call("tools/list", serde_json::json!({}))
            .await?;

        let tools = match resp.into_result() {
            Ok(result) => parse_tools_list(&result),
            Err(err) => {
                tracing::warn!(server = %self.name(), "tools/list failed: {}", err.message);
                Vec::new()
            }
        };

        tracing::info!(server = %self.name(), "discovered {} tools", tools.len());
        Ok(tools)
    }

    /// Call a tool and decode its result.
    ///
    /// Never fails: transport errors and server errors come back as an object
    /// with an `error` key so the conversation can carry on.
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> serde_json::Value {
        let params = serde_json::json!({
            "name": name,
            "arguments": arguments,
        });

        let resp = match self.transport.call("tools/call", params).await {
            Ok(resp) => Some(resp),
            Err(e) => {
                tracing::warn!(server = %self.name(), tool = name, "tool call failed: {e}");
                None
            }
        };
        interpret_tool_response(resp)
    }

    /// Stop the server process. Safe to call more than once.
    pub async fn stop(&self) -> Option<ShutdownOutcome> {
        self.transport.shutdown().await
    }
}

impl ToolExecutor for McpClient {
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = serde_json::Value> + Send + 'a>> {
        Box::pin(McpClient::call_tool(self, name, arguments))
    }
}
