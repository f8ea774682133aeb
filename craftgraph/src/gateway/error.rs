//! Gateway errors and their retry classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified provider condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QuotaExceeded,
    SafetyBlocked,
    Transient,
    MalformedOutput,
    /// Provider not configured or capability missing.
    Unavailable,
}

impl ErrorKind {
    /// Transient and malformed output are retried; everything else is terminal for the call.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::MalformedOutput)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::SafetyBlocked => "safety_blocked",
            ErrorKind::Transient => "transient",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Error returned by a [`ModelGateway`](super::ModelGateway) call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("blocked by provider safety filter: {0}")]
    SafetyBlocked(String),

    /// Network hiccup, 5xx, rate limiting.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The attempt exceeded the task type's timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("model unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            GatewayError::SafetyBlocked(_) => ErrorKind::SafetyBlocked,
            GatewayError::Transient(_) | GatewayError::Timeout(_) => ErrorKind::Transient,
            GatewayError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            GatewayError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
