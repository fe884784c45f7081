//! MCP initialize/initialized exchange.

use crate::error::McpError;
use crate::transport::StdioTransport;
use serde::Deserialize;

/// MCP protocol version we speak.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name we report in `clientInfo`.
pub const CLIENT_NAME: &str = "rvr-chat";

/// What the server reported about itself during `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Protocol version the server agreed to, if it said.
    #[serde(skip)]
    pub protocol_version: Option<String>,
}

/// Build the `initialize` params.
pub fn initialize_params() -> serde_json::Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": CLIENT_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

/// Run the handshake. No tool call is valid until this succeeds.
///
/// A response without a `result` (an error response included) fails the
/// handshake. On success the `notifications/initialized` notification has
/// been sent.
pub async fn handshake(transport: &StdioTransport) -> Result<ServerInfo, McpError> {
    let resp = transport.call("initialize", initialize_params()).await?;

    let result = resp.into_result().map_err(|err| McpError::HandshakeFailed {
        name: transport.name().to_string(),
        message: err.message,
    })?;

    let mut info: ServerInfo = result
        .get("serverInfo")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    info.protocol_version = result
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    transport
        .notify("notifications/initialized", serde_json::json!({}))
        .await?;

    tracing::info!(
        server = %transport.name(),
        server_name = %info.name,
        server_version = %info.version,
        "MCP handshake complete"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_params_shape() {
        let params = initialize_params();
        assert_eq!(params["protocolVersion"], "2024-11-05");
        assert_eq!(params["capabilities"], serde_json::json!({}));
        assert_eq!(params["clientInfo"]["name"], "rvr-chat");
        assert!(params["clientInfo"]["version"].is_string());
    }

    #[test]
    fn server_info_tolerates_missing_fields() {
        let info: ServerInfo = serde_json::from_value(serde_json::json!({"name": "rvr"})).unwrap();
        assert_eq!(info.name, "rvr");
        assert_eq!(info.version, "");
        assert!(info.protocol_version.is_none());
    }
}
