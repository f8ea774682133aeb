//! Scripted gateway for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayError, ImageArtifact, ImageRequest, ModelGateway, ModelRequest, TaskType};

#[derive(Default)]
struct Script {
    queued: HashMap<TaskType, VecDeque<Result<String, GatewayError>>>,
    sticky: HashMap<TaskType, Result<String, GatewayError>>,
    calls: Vec<ModelRequest>,
    images: VecDeque<Result<ImageArtifact, GatewayError>>,
    echo_images: bool,
    image_calls: Vec<ImageRequest>,
}

/// Deterministic [`ModelGateway`].
///
/// Replies per task type come from a FIFO queue (`push_*`); when the queue is
/// empty the sticky reply (`with_*`) is used; with neither, the call fails with
/// `Unavailable`, which every node treats as "use the offline fallback".
/// All requests are recorded.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<Script>,
    latency: Option<Duration>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues one reply for `task`.
    pub fn push_response(self, task: TaskType, text: impl Into<String>) -> Self {
        self.enqueue(task, Ok(text.into()));
        self
    }

    /// Queues one failure for `task`.
    pub fn push_error(self, task: TaskType, err: GatewayError) -> Self {
        self.enqueue(task, Err(err));
        self
    }

    /// Reply used for `task` whenever its queue is empty.
    pub fn with_response(self, task: TaskType, text: impl Into<String>) -> Self {
        self.script().sticky.insert(task, Ok(text.into()));
        self
    }

    /// Failure used for `task` whenever its queue is empty.
    pub fn with_error(self, task: TaskType, err: GatewayError) -> Self {
        self.script().sticky.insert(task, Err(err));
        self
    }

    /// Sleeps this long before every text reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues one image result.
    pub fn push_image(self, result: Result<ImageArtifact, GatewayError>) -> Self {
        self.script().images.push_back(result);
        self
    }

    /// When the image queue is empty, return an image whose bytes are the prompt.
    pub fn with_echo_images(self) -> Self {
        self.script().echo_images = true;
        self
    }

    /// Queues a reply at runtime (the gateway may already be shared).
    pub fn enqueue(&self, task: TaskType, result: Result<String, GatewayError>) {
        self.script()
            .queued
            .entry(task)
            .or_default()
            .push_back(result);
    }

    /// All text requests so far, in call order.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.script().calls.clone()
    }

    pub fn call_count(&self, task: TaskType) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|r| r.task_type == task)
            .count()
    }

    /// All image requests so far, in call order.
    pub fn image_calls(&self) -> Vec<ImageRequest> {
        self.script().image_calls.clone()
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut script = self.script();
        script.calls.push(request.clone());
        if let Some(next) = script
            .queued
            .get_mut(&request.task_type)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        match script.sticky.get(&request.task_type) {
            Some(result) => result.clone(),
            None => Err(GatewayError::Unavailable(format!(
                "no scripted reply for {}",
                request.task_type
            ))),
        }
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageArtifact, GatewayError> {
        let mut script = self.script();
        script.image_calls.push(request.clone());
        if let Some(next) = script.images.pop_front() {
            return next;
        }
        if script.echo_images {
            return Ok(ImageArtifact::new(
                "image/png",
                request.prompt.as_bytes().to_vec(),
            ));
        }
        Err(GatewayError::Unavailable("no scripted image".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Queue drains first, then the sticky reply, and calls are recorded.
    #[tokio::test]
    async fn queue_then_sticky() {
        let mock = MockGateway::new()
            .push_response(TaskType::Creative, "first")
            .with_response(TaskType::Creative, "always");
        let req = ModelRequest::new(TaskType::Creative, "p");
        assert_eq!(mock.complete(&req).await.unwrap(), "first");
        assert_eq!(mock.complete(&req).await.unwrap(), "always");
        assert_eq!(mock.complete(&req).await.unwrap(), "always");
        assert_eq!(mock.call_count(TaskType::Creative), 3);
        assert_eq!(mock.calls()[0].prompt, "p");
    }

    /// **Scenario**: Unscripted task types and images are Unavailable.
    #[tokio::test]
    async fn unscripted_is_unavailable() {
        let mock = MockGateway::new();
        let err = mock
            .complete(&ModelRequest::new(TaskType::Extraction, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
        let img = mock
            .generate_image(&ImageRequest {
                prompt: "x".into(),
                reference: None,
            })
            .await;
        assert!(img.is_err());
        assert_eq!(mock.image_calls().len(), 1);
    }

    /// **Scenario**: Echo images carry the prompt bytes.
    #[tokio::test]
    async fn echo_images_return_prompt_bytes() {
        let mock = MockGateway::new().with_echo_images();
        let art = mock
            .generate_image(&ImageRequest {
                prompt: "lamp".into(),
                reference: None,
            })
            .await
            .unwrap();
        assert_eq!(art.bytes, b"lamp".to_vec());
        assert!(!art.placeholder);
    }
}
