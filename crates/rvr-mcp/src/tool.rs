//! Tool catalog: server tool descriptors, their model-facing schema, and
//! decoding of `tools/call` replies.

use crate::jsonrpc::JsonRpcResponse;
use rvr_types::{ToolDefinition, tool_error};
use serde::Deserialize;
use serde_json::{Value, json};

/// Result returned when a tool call got no usable reply.
pub const NO_RESPONSE: &str = "No response from MCP server";

/// A tool advertised by the server in `tools/list`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<Value>,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Convert descriptors to the model's tool-calling schema, preserving order.
pub fn to_model_tools(descriptors: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    descriptors
        .iter()
        .map(|d| {
            ToolDefinition::function(
                d.name.clone(),
                d.description.clone().unwrap_or_default(),
                d.input_schema.clone().unwrap_or_else(empty_object_schema),
            )
        })
        .collect()
}

/// Extract descriptors from a `tools/list` result.
///
/// A missing or malformed `tools` member yields an empty list; individual
/// entries that do not decode are skipped.
pub fn parse_tools_list(result: &Value) -> Vec<ToolDescriptor> {
    let Some(entries) = result.get("tools").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(tool) => Some(tool),
            Err(e) => {
                tracing::warn!("skipping malformed tool descriptor: {e}");
                None
            }
        })
        .collect()
}

/// Decode a `tools/call` reply into the value handed back to the model.
///
/// Never fails: every failure becomes an object with an `error` key.
pub fn interpret_tool_response(resp: Option<JsonRpcResponse>) -> Value {
    let Some(resp) = resp else {
        return tool_error(NO_RESPONSE);
    };
    match resp.into_result() {
        Ok(result) => decode_tool_result(&result),
        Err(err) => tool_error(err.message),
    }
}

fn decode_tool_result(result: &Value) -> Value {
    let Some(first) = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|content| content.first())
    else {
        return tool_error(NO_RESPONSE);
    };

    let text = first.get("text").and_then(Value::as_str).unwrap_or("{}");
    serde_json::from_str(text).unwrap_or_else(|_| json!({"result": text}))
}
