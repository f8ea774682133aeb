//! Model call gateway: the single seam to the external text/image generation service.
//!
//! Nodes never talk to a provider directly. They build a [`ModelRequest`] and go
//! through [`call_with_retry`], which bounds each attempt by the task type's
//! timeout, classifies failures, backs off, repairs sloppy JSON and hands back a
//! tagged [`ModelOutcome`].
//!
//! Implementations: [`MockGateway`] (scripted, deterministic; tests and offline
//! runs) and `OpenAiGateway` (feature `openai`).

mod error;
mod mock;
mod outcome;
pub mod parse;
mod retry;
mod task;

#[cfg(feature = "openai")]
mod openai;

pub use error::{ErrorKind, GatewayError};
pub use mock::MockGateway;
pub use outcome::ModelOutcome;
pub use retry::{call_with_retry, generate_image_with_retry, RetryPolicy};
pub use task::{TaskProfile, TaskType};

#[cfg(feature = "openai")]
pub use openai::OpenAiGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    pub task_type: TaskType,
    /// JSON Schema the reply must satisfy; providers may use it for structured output.
    pub response_schema: Option<Value>,
    /// Overrides `RetryPolicy::max_retries` for this call.
    pub max_retries: Option<u32>,
}

impl ModelRequest {
    pub fn new(task_type: TaskType, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            task_type,
            response_schema: None,
            max_retries: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// One image-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Bytes of the previous variant, used as a visual conditioning reference.
    pub reference: Option<Vec<u8>>,
}

/// Generated (or placeholder) image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// True when no provider image was produced and this stands in for one.
    pub placeholder: bool,
}

impl ImageArtifact {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
            placeholder: false,
        }
    }

    /// Empty stand-in; rendering a visible placeholder is the presentation layer's job.
    pub fn placeholder() -> Self {
        Self {
            mime_type: "image/png".to_string(),
            bytes: Vec::new(),
            placeholder: true,
        }
    }
}

/// External generation service.
///
/// **Interaction**: Injected as `Arc<dyn ModelGateway>` into the orchestrator and
/// from there into every node executor; wrapped by [`call_with_retry`].
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Single attempt at a text completion. Retrying is the caller's concern.
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError>;

    /// Single attempt at an image. Defaults to `Unavailable`.
    async fn generate_image(&self, _request: &ImageRequest) -> Result<ImageArtifact, GatewayError> {
        Err(GatewayError::Unavailable(
            "image generation not supported by this gateway".to_string(),
        ))
    }
}
