//! `image_generate`: render the next pending concept variant.
//!
//! One variant per step. The previous real (non-placeholder) image is passed
//! as the conditioning reference so the variants stay visually consistent.

use std::sync::Arc;

use async_trait::async_trait;

use crate::gateway::{generate_image_with_retry, ImageArtifact, ImageRequest};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::state::{Phase, WorkflowErrorRecord, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::IMAGE_GENERATE;

pub struct ImageGenerate {
    ctx: Arc<ExecutorContext>,
}

impl ImageGenerate {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for ImageGenerate {
    fn id(&self) -> &'static str {
        IMAGE_GENERATE
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let ceiling = self.ctx.config.image_iteration_ceiling();
        let mut variants = state.concept_variants.clone();
        let mut update = StateUpdate::new();

        let Some(slot) = variants.iter().position(|v| v.is_pending()) else {
            update.phase = Some(Phase::OutputAssembly);
            return Ok(update);
        };

        let reference = variants[..slot]
            .iter()
            .rev()
            .filter_map(|v| v.image.as_ref())
            .find(|img| !img.placeholder)
            .map(|img| img.bytes.clone());
        let request = ImageRequest {
            prompt: variants[slot].prompt.clone(),
            reference,
        };
        let image = match generate_image_with_retry(
            self.ctx.gateway.as_ref(),
            &request,
            &self.ctx.config.retry_policy,
        )
        .await
        {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(variant = slot, error = %err, "image generation failed, using placeholder");
                update.push_error(WorkflowErrorRecord::recoverable(
                    "image_placeholder",
                    IMAGE_GENERATE,
                    format!("variant {}: {}", slot + 1, err),
                ));
                ImageArtifact::placeholder()
            }
        };
        variants[slot].image = Some(image);

        let iterations = state.image_iterations + 1;
        let any_pending = variants.iter().any(|v| v.is_pending());
        if !any_pending || iterations >= ceiling {
            update.phase = Some(Phase::OutputAssembly);
        }
        update.concept_variants = Some(variants);
        update.image_iterations = Some(iterations);
        Ok(update)
    }
}
