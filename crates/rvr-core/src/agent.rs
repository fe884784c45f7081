//! The chat turn loop: stream the model, run its tool calls, feed results back.

use futures_util::StreamExt;
use rvr_session::ConversationMemory;
use rvr_types::{
    ChatError, ChatOptions, ChatRequest, Role, ToolCall, ToolDefinition, ToolExecutor, Usage,
    provider::ChatProvider,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Maximum number of tool rounds in one turn.
pub const MAX_TOOL_ROUNDS: usize = 10;

/// Events emitted by the agent during a turn.
#[derive(Debug)]
pub enum AgentEvent {
    /// A text delta from the assistant's response.
    TextDelta(String),
    /// A tool is about to be called.
    ToolStart {
        name: String,
        arguments: serde_json::Value,
    },
    /// A tool call returned.
    ToolEnd {
        name: String,
        result: serde_json::Value,
    },
    /// Token usage accumulated over the turn.
    Usage(Usage),
    /// The turn finished.
    Done,
    /// The turn was cancelled (e.g. Ctrl+C).
    Cancelled,
    /// An error occurred.
    Error(String),
}

/// One streamed model reply.
#[derive(Debug, Default)]
struct Reply {
    text: String,
    tool_calls: Vec<ToolCall>,
}

/// Runs chat turns against a model, executing tool calls on the robot server.
pub struct Agent {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<dyn ToolExecutor>,
    model: String,
    temperature: f64,
    tool_defs: Vec<ToolDefinition>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<dyn ToolExecutor>,
        model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature,
            tool_defs: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Replace the tool list offered to the model.
    pub fn set_tools(&mut self, tool_defs: Vec<ToolDefinition>) {
        self.tool_defs = tool_defs;
    }

    pub fn tool_count(&self) -> usize {
        self.tool_defs.len()
    }

    /// Run one turn. The caller has already added the user message to
    /// `memory`.
    ///
    /// Tool rounds repeat while the model keeps calling tools, up to
    /// [`MAX_TOOL_ROUNDS`]. A model failure is recorded in `memory` as the
    /// assistant reply and also returned.
    pub async fn run<F>(
        &self,
        memory: &mut ConversationMemory,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<Usage, ChatError>
    where
        F: FnMut(AgentEvent),
    {
        let mut total_usage = Usage::default();

        for round in 0..=MAX_TOOL_ROUNDS {
            let reply = match self
                .stream_reply(memory, &cancel, &mut total_usage, &mut on_event)
                .await
            {
                Ok(reply) => reply,
                Err(ChatError::Cancelled) => {
                    on_event(AgentEvent::Cancelled);
                    return Err(ChatError::Cancelled);
                }
                Err(ChatError::Api(e)) => {
                    let message = if round == 0 {
                        format!("LLM error: {e}")
                    } else {
                        format!("Error getting follow-up: {e}")
                    };
                    tracing::warn!("{message}");
                    memory.add_message(Role::Assistant, message.clone(), Vec::new());
                    on_event(AgentEvent::Error(message));
                    return Err(ChatError::Api(e));
                }
            };

            if reply.tool_calls.is_empty() {
                memory.add_message(Role::Assistant, reply.text, Vec::new());
                on_event(AgentEvent::Done);
                on_event(AgentEvent::Usage(total_usage.clone()));
                return Ok(total_usage);
            }

            if round == MAX_TOOL_ROUNDS {
                break;
            }

            // The tool-call message and its results are recorded together;
            // a cancelled round records neither.
            let mut results = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                let name = call.function.name.clone();
                let arguments = call.function.arguments.clone();
                on_event(AgentEvent::ToolStart {
                    name: name.clone(),
                    arguments: arguments.clone(),
                });
                tracing::debug!("calling tool {name}");

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        on_event(AgentEvent::Cancelled);
                        return Err(ChatError::Cancelled);
                    }
                    result = self.tools.call_tool(&name, arguments) => result
                };
                if let Some(error) = rvr_types::tool_error_message(&result) {
                    tracing::warn!("tool {name} failed: {error}");
                }

                on_event(AgentEvent::ToolEnd {
                    name: name.clone(),
                    result: result.clone(),
                });
                results.push((name, result));
            }

            memory.add_message(Role::Assistant, reply.text, reply.tool_calls);
            for (name, result) in &results {
                memory.add_tool_result(name, result);
            }
        }

        tracing::warn!("tool loop stopped after {MAX_TOOL_ROUNDS} rounds");
        on_event(AgentEvent::Error(format!(
            "Maximum tool rounds ({MAX_TOOL_ROUNDS}) reached"
        )));
        on_event(AgentEvent::Usage(total_usage.clone()));
        Ok(total_usage)
    }

    fn request(&self, memory: &ConversationMemory) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: memory.messages().to_vec(),
            tools: self.tool_defs.clone(),
            options: Some(ChatOptions {
                temperature: Some(self.temperature),
            }),
            stream: true,
        }
    }

    async fn stream_reply<F>(
        &self,
        memory: &ConversationMemory,
        cancel: &CancellationToken,
        total_usage: &mut Usage,
        on_event: &mut F,
    ) -> Result<Reply, ChatError>
    where
        F: FnMut(AgentEvent),
    {
        let request = self.request(memory);

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            stream = self.provider.chat_stream(&request) => stream?,
        };

        let mut reply = Reply::default();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                chunk = stream.next() => match chunk {
                    Some(Ok(chunk)) => {
                        let text = chunk.text();
                        if !text.is_empty() {
                            on_event(AgentEvent::TextDelta(text.to_string()));
                            reply.text.push_str(text);
                        }
                        if let Some(message) = chunk.message.as_ref() {
                            reply.tool_calls.extend(message.tool_calls.iter().cloned());
                        }
                        if chunk.done {
                            total_usage.add(&chunk.usage());
                            break;
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_event_cancelled_debug() {
        assert_eq!(format!("{:?}", AgentEvent::Cancelled), "Cancelled");
    }

    #[test]
    fn chat_error_cancelled_display() {
        assert_eq!(ChatError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn reply_defaults_empty() {
        let reply = Reply::default();
        assert!(reply.text.is_empty());
        assert!(reply.tool_calls.is_empty());
    }
}
