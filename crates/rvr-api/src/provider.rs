//! Ollama implementation of the chat provider trait.

use crate::client::OllamaClient;
use crate::retry::RetryConfig;
use rvr_types::provider::{ChatProvider, ChunkStream};
use rvr_types::{ApiError, ChatRequest};
use std::future::Future;
use std::pin::Pin;

/// Ollama chat provider.
///
/// Wraps `OllamaClient` and implements `ChatProvider`. Retry logic stays in
/// the client.
#[derive(Clone)]
pub struct OllamaProvider {
    client: OllamaClient,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: OllamaClient::new(base_url)?,
        })
    }

    pub fn from_client(client: OllamaClient) -> Self {
        Self { client }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(config);
        self
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }
}

impl ChatProvider for OllamaProvider {
    fn chat_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkStream, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let stream = self.client.chat_stream(request).await?;
            Ok(Box::pin(stream) as ChunkStream)
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name() {
        let provider = OllamaProvider::new("http://localhost:11434").unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.client().base_url(), "http://localhost:11434");
    }

    #[test]
    fn provider_with_retry() {
        let provider = OllamaProvider::new("http://localhost:11434")
            .unwrap()
            .with_retry_config(RetryConfig::none());
        assert_eq!(provider.name(), "ollama");
    }
}
