//! Tool execution seam between the chat loop and the robot server.

use std::future::Future;
use std::pin::Pin;

/// Key under which a failed tool call reports its message.
pub const TOOL_ERROR_KEY: &str = "error";

/// Executes named tools on behalf of the model.
///
/// Implementations never fail: every failure is returned as a JSON object
/// carrying an `error` key, so the conversation can narrate it.
pub trait ToolExecutor: Send + Sync {
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = serde_json::Value> + Send + 'a>>;
}

/// Build the `{"error": message}` value used for tool failures.
pub fn tool_error(message: impl Into<String>) -> serde_json::Value {
    let message: String = message.into();
    serde_json::json!({ TOOL_ERROR_KEY: message })
}

/// The error message of a tool result, if it is a failure.
pub fn tool_error_message(result: &serde_json::Value) -> Option<&str> {
    result.get(TOOL_ERROR_KEY).and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_shape() {
        let value = tool_error("Not connected");
        assert_eq!(value, serde_json::json!({"error": "Not connected"}));
        assert_eq!(tool_error_message(&value), Some("Not connected"));
    }

    #[test]
    fn success_has_no_error_message() {
        let value = serde_json::json!({"success": true});
        assert!(tool_error_message(&value).is_none());
    }

    #[test]
    fn executor_is_dyn_compatible() {
        fn _assert_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_send_sync::<dyn ToolExecutor>();
    }
}
