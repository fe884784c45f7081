//! Ollama HTTP API client.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use rvr_types::{ApiError, ChatRequest};

use crate::retry::{RetryConfig, is_retryable};
use crate::stream::ChatStream;
use crate::types::{ModelInfo, PullRequest, PullResponse, TagsResponse};

/// Timeout for quick metadata calls such as listing models.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl OllamaClient {
    /// Create a new client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Set the retry configuration for transient errors (5xx, network).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List installed models (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        tracing::debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, None));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::StreamParse(format!("tags: {e}")))?;
        Ok(tags.models)
    }

    /// Download a model (`POST /api/pull`), waiting until it completes.
    pub async fn pull_model(&self, model: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/pull", self.base_url);
        tracing::info!(model, "pulling model");

        let response = self
            .http
            .post(&url)
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, Some(model)));
        }

        let pulled: PullResponse = response
            .json()
            .await
            .map_err(|e| ApiError::StreamParse(format!("pull: {e}")))?;
        match pulled.error {
            Some(message) => Err(ApiError::Stream(message)),
            None => {
                tracing::info!(model, status = %pulled.status, "pull finished");
                Ok(())
            }
        }
    }

    /// Send a streaming chat request (`POST /api/chat`) and return a stream
    /// of chunks.
    ///
    /// Transient failures before the stream opens are retried with backoff.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let body = serde_json::to_string(request).map_err(|e| ApiError::BadRequest {
            message: format!("Failed to serialize request: {e}"),
        })?;

        let mut attempt = 0;
        loop {
            tracing::debug!(
                "POST {url} (attempt {}/{})",
                attempt + 1,
                self.retry_config.max_retries + 1
            );

            let err = match self.http.post(&url).body(body.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(ChatStream::new(response.bytes_stream()));
                    }
                    let body_text = response.text().await.unwrap_or_default();
                    classify_error(status.as_u16(), &body_text, Some(&request.model))
                }
                Err(e) => transport_error(e),
            };

            if !is_retryable(&err) || attempt >= self.retry_config.max_retries {
                return Err(err);
            }

            let delay = self.retry_config.delay_for(attempt);
            tracing::warn!(
                "Retryable Ollama error (attempt {}/{}): {err}. Retrying in {delay:?}",
                attempt + 1,
                self.retry_config.max_retries + 1,
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Classify an HTTP error response into a typed ApiError.
///
/// Ollama error bodies look like `{"error":"message"}`.
fn classify_error(status: u16, body: &str, model: Option<&str>) -> ApiError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        400 => ApiError::BadRequest { message },
        404 => match model {
            Some(model) => ApiError::ModelNotFound {
                model: model.to_string(),
            },
            None => ApiError::Server { status, message },
        },
        503 => ApiError::Overloaded,
        _ => ApiError::Server { status, message },
    }
}
