//! Ollama chat API client with NDJSON streaming for RVR Chat.

mod client;
mod ndjson;
mod provider;
mod retry;
mod stream;
mod types;

pub use client::OllamaClient;
pub use provider::OllamaProvider;
pub use retry::RetryConfig;
pub use stream::ChatStream;
pub use types::{ModelInfo, model_is_available};
