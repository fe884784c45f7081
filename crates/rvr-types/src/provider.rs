//! Provider trait for streaming chat backends.

use crate::{ApiError, ChatChunk, ChatRequest};
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;

/// A boxed async stream of chunks from a chat provider.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, ApiError>> + Send>>;

/// Trait for chat model providers.
///
/// Dyn-compatible so the agent works with `Arc<dyn ChatProvider>`.
pub trait ChatProvider: Send + Sync {
    /// Send a streaming chat request, returning a stream of chunks.
    fn chat_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkStream, ApiError>> + Send + 'a>>;

    /// Provider name for logging/display (e.g., "ollama").
    fn name(&self) -> &str;
}
