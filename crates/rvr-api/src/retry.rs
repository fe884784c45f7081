//! Backoff policy for Ollama requests that fail before the stream opens.

use rand::Rng;
use rvr_types::ApiError;
use std::time::Duration;

/// How often and how patiently a chat request is retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = try once).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Growth of the delay per attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Try once, never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// `initial_delay * backoff_factor^attempt`, jittered by ±25% and never
    /// above `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let ceiling = self.max_delay.as_secs_f64();

        let jitter = rand::rng().random_range(0.75..=1.25);
        Duration::from_secs_f64((base.min(ceiling) * jitter).min(ceiling))
    }
}

/// Whether a failed request is worth sending again.
///
/// A model that is loading (503), a 5xx, a refused connection and a timeout
/// are transient. Bad requests, unknown models and errors reported inside an
/// open stream are not.
pub fn is_retryable(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::Overloaded | ApiError::Server { .. } | ApiError::Network(_) | ApiError::Timeout
    )
}
