//! Retry & fallback controller wrapped around every gateway call.

use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;

use super::parse::parse_with_repair;
use super::{
    GatewayError, ImageArtifact, ImageRequest, ModelGateway, ModelOutcome, ModelRequest, TaskType,
};

/// Exponential backoff settings: `delay = min(base * 2^attempt + jitter, max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Policy that never sleeps; handy for offline runs.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt + 1` (attempt counts from 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let exp = self.base_delay.saturating_mul(factor);
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        (exp + jitter).min(self.max_delay)
    }
}

enum LastFailure {
    Malformed(String),
    Provider(GatewayError),
}

/// Calls the gateway with timeout, classification, backoff and parse repair.
///
/// Quota, safety and unavailable failures return immediately as
/// `ProviderError`. Transient failures (timeouts included) and unparseable
/// replies are retried with the same prompt; once retries are exhausted the
/// last failure is returned (`SchemaError` carries the last raw reply).
pub async fn call_with_retry<T>(
    gateway: &dyn ModelGateway,
    request: &ModelRequest,
    policy: &RetryPolicy,
) -> ModelOutcome<T>
where
    T: DeserializeOwned,
{
    let max_retries = request.max_retries.unwrap_or(policy.max_retries);
    let timeout = request.task_type.profile().timeout;
    let mut last = LastFailure::Provider(GatewayError::Unavailable("no attempt made".into()));

    for attempt in 0..=max_retries {
        let result = match tokio::time::timeout(timeout, gateway.complete(request)).await {
            Ok(r) => r,
            Err(_) => Err(GatewayError::Timeout(timeout)),
        };
        match result {
            Ok(raw) => match parse_with_repair::<T>(&raw) {
                Ok(data) => return ModelOutcome::Success { data },
                Err(reason) => {
                    tracing::warn!(
                        task = %request.task_type,
                        attempt,
                        %reason,
                        "model output failed schema validation"
                    );
                    last = LastFailure::Malformed(raw);
                }
            },
            Err(err) if !err.is_retryable() => {
                tracing::warn!(task = %request.task_type, error = %err, "terminal model error");
                return ModelOutcome::ProviderError {
                    kind: err.kind(),
                    message: err.to_string(),
                };
            }
            Err(err) => {
                tracing::warn!(task = %request.task_type, attempt, error = %err, "retryable model error");
                last = LastFailure::Provider(err);
            }
        }
        if attempt < max_retries {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }

    match last {
        LastFailure::Malformed(raw) => ModelOutcome::SchemaError { raw },
        LastFailure::Provider(err) => ModelOutcome::ProviderError {
            kind: err.kind(),
            message: err.to_string(),
        },
    }
}

/// Image counterpart of [`call_with_retry`]: same timeout and classification, no parsing.
pub async fn generate_image_with_retry(
    gateway: &dyn ModelGateway,
    request: &ImageRequest,
    policy: &RetryPolicy,
) -> Result<ImageArtifact, GatewayError> {
    let timeout = TaskType::Image.profile().timeout;
    let mut last = GatewayError::Unavailable("no attempt made".into());
    for attempt in 0..=policy.max_retries {
        let result = match tokio::time::timeout(timeout, gateway.generate_image(request)).await {
            Ok(r) => r,
            Err(_) => Err(GatewayError::Timeout(timeout)),
        };
        match result {
            Ok(artifact) => return Ok(artifact),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "retryable image error");
                last = err;
            }
        }
        if attempt < policy.max_retries {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }
    Err(last)
}
