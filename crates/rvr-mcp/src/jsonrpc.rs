//! JSON-RPC 2.0 types for MCP communication.
//!
//! Outgoing messages are plain serializable structs. Incoming lines are
//! classified into [`JsonRpcMessage`] variants; anything that does not fit one
//! of the shapes is rejected so the caller can skip it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

fn unknown_error() -> String {
    "Unknown error".to_string()
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default = "unknown_error")]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self {
                code: None,
                message,
                data: None,
            },
            other => serde_json::from_value(other).unwrap_or_else(|_| Self {
                code: None,
                message: unknown_error(),
                data: None,
            }),
        }
    }
}

/// Success or failure half of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Result(Value),
    Error(JsonRpcError),
}

/// A JSON-RPC 2.0 response, carrying exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub outcome: ResponseOutcome,
}

impl JsonRpcResponse {
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            ResponseOutcome::Result(value) => Some(value),
            ResponseOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            ResponseOutcome::Result(_) => None,
            ResponseOutcome::Error(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.outcome {
            ResponseOutcome::Result(value) => Ok(value),
            ResponseOutcome::Error(err) => Err(err),
        }
    }
}

/// Any message a server may write to its stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    Request {
        id: u64,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Classify a decoded JSON value. Returns `None` for values that are not
    /// a well-formed request, notification or response.
    ///
    /// The `jsonrpc` version member is not required; ids must be non-negative
    /// integers.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let method = match map.remove("method") {
            Some(Value::String(method)) => Some(method),
            Some(_) => return None,
            None => None,
        };
        let id = match map.remove("id") {
            Some(id) => Some(id.as_u64()?),
            None => None,
        };

        match (method, id) {
            (Some(method), id) => {
                if map.contains_key("result") || map.contains_key("error") {
                    return None;
                }
                let params = take_params(&mut map);
                Some(match id {
                    Some(id) => JsonRpcMessage::Request { id, method, params },
                    None => JsonRpcMessage::Notification { method, params },
                })
            }
            (None, Some(id)) => {
                let outcome = match (map.remove("result"), map.remove("error")) {
                    (Some(result), None) => ResponseOutcome::Result(result),
                    (None, Some(error)) => ResponseOutcome::Error(JsonRpcError::from_value(error)),
                    _ => return None,
                };
                Some(JsonRpcMessage::Response(JsonRpcResponse { id, outcome }))
            }
            (None, None) => None,
        }
    }

    /// Method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request { method, .. } | JsonRpcMessage::Notification { method, .. } => {
                Some(method)
            }
            JsonRpcMessage::Response(_) => None,
        }
    }
}

fn take_params(map: &mut Map<String, Value>) -> Value {
    map.remove("params")
        .unwrap_or_else(|| Value::Object(Map::new()))
}
