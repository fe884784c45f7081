//! Bounded in-memory conversation history.

use crate::types::{SavedConversation, SessionMetadata};
use rvr_types::{ChatMessage, Role, ToolCall};

/// Conversation history sent to the model on every turn.
///
/// Holds at most `max_messages` messages. When the limit is exceeded the
/// oldest messages are dropped, except a leading system prompt, which always
/// stays.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    max_messages: usize,
    messages: Vec<ChatMessage>,
    session_name: Option<String>,
    metadata: SessionMetadata,
}

impl ConversationMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            messages: Vec::new(),
            session_name: None,
            metadata: SessionMetadata::now(),
        }
    }

    /// Append a message with optional tool calls.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>, tool_calls: Vec<ToolCall>) {
        let mut message = ChatMessage::new(role, content);
        message.tool_calls = tool_calls;
        self.push(message);
    }

    /// Append a tool result. Strings are stored as-is, anything else as JSON
    /// text.
    pub fn add_tool_result(&mut self, tool_name: &str, result: &serde_json::Value) {
        let content = match result {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.push(ChatMessage::tool(tool_name, content));
    }

    /// Append any message, trimming if over the limit.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.metadata.touch();
        self.trim();
    }

    fn trim(&mut self) {
        if self.messages.len() <= self.max_messages {
            return;
        }
        let keep_system = self.messages[0].role == Role::System;
        let start = if keep_system { 1 } else { 0 };
        let excess = self.messages.len() - self.max_messages;
        self.messages.drain(start..start + excess);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    pub fn set_session_name(&mut self, name: impl Into<String>) {
        self.session_name = Some(name.into());
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Drop the history, keeping the system prompt if there is one.
    pub fn clear(&mut self) {
        self.messages.truncate(
            usize::from(self.messages.first().is_some_and(|m| m.role == Role::System)),
        );
        self.metadata.touch();
    }

    /// Build the on-disk form under `name`.
    pub fn to_saved(&self, name: &str) -> SavedConversation {
        SavedConversation {
            session_name: name.to_string(),
            metadata: self.metadata.clone(),
            messages: self.messages.clone(),
        }
    }

    /// Replace the history with a saved conversation.
    ///
    /// The loaded messages are trimmed to this memory's limit.
    pub fn restore(&mut self, saved: SavedConversation) {
        self.session_name = Some(saved.session_name);
        self.metadata = saved.metadata;
        self.messages = saved.messages;
        self.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvr_types::FunctionCall;
    use serde_json::json;

    fn contents(memory: &ConversationMemory) -> Vec<&str> {
        memory.messages().iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn trims_oldest_keeping_system_prompt() {
        let mut memory = ConversationMemory::new(3);
        memory.add_message(Role::System, "sys", Vec::new());
        for i in 0..5 {
            memory.add_message(Role::User, format!("m{i}"), Vec::new());
        }
        assert_eq!(contents(&memory), vec!["sys", "m3", "m4"]);
    }

    #[test]
    fn trims_without_system_prompt() {
        let mut memory = ConversationMemory::new(2);
        for i in 0..4 {
            memory.add_message(Role::User, format!("m{i}"), Vec::new());
        }
        assert_eq!(contents(&memory), vec!["m2", "m3"]);
    }

    #[test]
    fn tool_results_count_towards_limit() {
        let mut memory = ConversationMemory::new(3);
        memory.add_message(Role::System, "sys", Vec::new());
        memory.add_message(Role::User, "drive", Vec::new());
        memory.add_tool_result("drive_forward", &json!({"success": true}));
        memory.add_tool_result("get_battery_status", &json!({"battery_percentage": 80}));
        assert_eq!(memory.len(), 3);
        assert_eq!(memory.messages()[0].role, Role::System);
        assert_eq!(memory.messages()[1].name.as_deref(), Some("drive_forward"));
    }

    #[test]
    fn tool_result_encoding() {
        let mut memory = ConversationMemory::new(10);
        memory.add_tool_result("a", &json!("plain text"));
        memory.add_tool_result("b", &json!({"battery_percentage": 87}));
        assert_eq!(memory.messages()[0].content, "plain text");
        assert_eq!(memory.messages()[1].content, r#"{"battery_percentage":87}"#);
        assert_eq!(memory.messages()[1].role, Role::Tool);
    }

    #[test]
    fn assistant_tool_calls_are_kept() {
        let mut memory = ConversationMemory::new(10);
        memory.add_message(
            Role::Assistant,
            "",
            vec![ToolCall {
                id: None,
                function: FunctionCall {
                    name: "connect".into(),
                    arguments: json!({}),
                },
            }],
        );
        assert_eq!(memory.messages()[0].tool_calls.len(), 1);
    }

    #[test]
    fn clear_keeps_system_prompt() {
        let mut memory = ConversationMemory::new(10);
        memory.add_message(Role::System, "sys", Vec::new());
        memory.add_message(Role::User, "hi", Vec::new());
        memory.clear();
        assert_eq!(contents(&memory), vec!["sys"]);

        let mut memory = ConversationMemory::new(10);
        memory.add_message(Role::User, "hi", Vec::new());
        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn zero_limit_is_clamped() {
        let mut memory = ConversationMemory::new(0);
        assert_eq!(memory.max_messages(), 1);
        memory.add_message(Role::User, "a", Vec::new());
        memory.add_message(Role::User, "b", Vec::new());
        assert_eq!(contents(&memory), vec!["b"]);
    }

    #[test]
    fn restore_replaces_history() {
        let mut source = ConversationMemory::new(10);
        source.add_message(Role::System, "sys", Vec::new());
        source.add_message(Role::User, "hello", Vec::new());
        let saved = source.to_saved("demo");

        let mut target = ConversationMemory::new(10);
        target.add_message(Role::User, "other", Vec::new());
        target.restore(saved);
        assert_eq!(target.session_name(), Some("demo"));
        assert_eq!(contents(&target), vec!["sys", "hello"]);
    }
}
