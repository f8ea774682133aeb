//! `prompt_build`: one image prompt per concept variant.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::outputs::ConceptVariant;
use crate::workflow::state::{Phase, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{describe_ingredients, fallback_error, PROMPT_BUILD};

/// Visual style of each variant slot, in order. Cycled when more variants are configured.
pub const VARIANT_STYLES: [&str; 3] = [
    "hero product shot",
    "in-use lifestyle scene",
    "exploded materials diagram",
];

#[derive(Debug, Deserialize)]
struct PromptPayload {
    prompts: Vec<String>,
}

fn subject(state: &WorkflowState) -> String {
    match (&state.selected_option, &state.artifact_type) {
        (Some(option), _) => option.title.clone(),
        (None, Some(artifact)) => format!("upcycled {}", artifact),
        (None, None) => "upcycled craft project".to_string(),
    }
}

fn template_prompt(subject: &str, materials: &str, style: &str) -> String {
    format!(
        "{} of a {} made from {}, natural light, clean background",
        style, subject, materials
    )
}

pub struct PromptBuild {
    ctx: Arc<ExecutorContext>,
}

impl PromptBuild {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for PromptBuild {
    fn id(&self) -> &'static str {
        PROMPT_BUILD
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let count = self.ctx.config.variant_count;
        let styles: Vec<&str> = VARIANT_STYLES.iter().copied().cycle().take(count).collect();
        let subject = subject(state);
        let materials = describe_ingredients(&state.ingredients);

        let prompt = format!(
            "Write {} image-generation prompts for \"{}\" built from {}. \
             Styles, in order: {}.",
            count,
            subject,
            materials,
            styles.join("; ")
        );
        let schema = json!({
            "type": "object",
            "required": ["prompts"],
            "properties": {"prompts": {"type": "array", "items": {"type": "string"}}}
        });
        let outcome = self
            .ctx
            .call::<PromptPayload>(ModelRequest::new(TaskType::Creative, prompt).with_schema(schema))
            .await;

        let mut update = StateUpdate {
            phase: Some(Phase::ConceptGeneration),
            ..StateUpdate::new()
        };
        if let Some(err) = fallback_error(PROMPT_BUILD, TaskType::Creative, &outcome) {
            update.push_error(err);
        }
        let mut drafted = match outcome {
            ModelOutcome::Success { data } => data.prompts,
            _ => Vec::new(),
        }
        .into_iter();

        let variants = styles
            .iter()
            .enumerate()
            .map(|(index, style)| {
                let prompt = drafted
                    .next()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| template_prompt(&subject, &materials, style));
                ConceptVariant {
                    index,
                    style: style.to_string(),
                    prompt,
                    image: None,
                }
            })
            .collect();

        update.concept_variants = Some(variants);
        update.image_iterations = Some(0);
        Ok(update)
    }
}
