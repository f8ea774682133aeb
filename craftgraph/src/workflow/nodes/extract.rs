//! `extract`: free text → ingredient candidates.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::parse::salvage_string_fields;
use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::{Category, Ingredient, IngredientSource};
use crate::workflow::state::{WorkflowErrorRecord, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{fallback_error, EXTRACT};

/// Confidence of the single ingredient used when extraction fails.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;
const DEFAULT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractedIngredient {
    name: Option<String>,
    size: Option<String>,
    material: Option<String>,
    category: Option<String>,
    condition: Option<String>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    ingredients: Vec<ExtractedIngredient>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ExtractedIngredient {
    fn into_ingredient(self) -> Option<Ingredient> {
        let name = non_blank(self.name);
        let size = non_blank(self.size);
        let material = non_blank(self.material);
        if name.is_none() && size.is_none() && material.is_none() {
            return None;
        }
        let mut ing = Ingredient::new(
            name,
            IngredientSource::Extracted,
            self.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        );
        ing.size = size;
        ing.material = material;
        ing.category = self.category.as_deref().and_then(Category::parse);
        ing.condition = non_blank(self.condition);
        ing.refresh_clarification_flag();
        Some(ing)
    }
}

/// Single low-confidence ingredient named after the raw input.
pub fn fallback_ingredient(user_input: &str) -> Ingredient {
    let name = user_input.trim();
    let mut ing = Ingredient::new(
        (!name.is_empty()).then(|| name.to_string()),
        IngredientSource::User,
        FALLBACK_CONFIDENCE,
    );
    ing.needs_clarification = true;
    ing
}

/// Field-by-field recovery from an unparseable reply.
fn salvage(raw: &str) -> Vec<Ingredient> {
    let names = salvage_string_fields(raw, "name");
    let materials = salvage_string_fields(raw, "material");
    let sizes = salvage_string_fields(raw, "size");
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let mut ing = Ingredient::named(name, IngredientSource::Extracted, DEFAULT_CONFIDENCE);
            // Only trust positional pairing when the lists line up.
            if materials.len() == sizes.len() {
                ing.material = materials.get(i).cloned();
                ing.size = sizes.get(i).cloned();
            }
            ing.refresh_clarification_flag();
            ing
        })
        .collect()
}

pub struct Extract {
    ctx: Arc<ExecutorContext>,
}

impl Extract {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for Extract {
    fn id(&self) -> &'static str {
        EXTRACT
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let prompt = format!(
            "List every raw material in this description as ingredients with name, size, \
             material, category (container, fastener, decorative, tool, other), condition \
             and a confidence between 0 and 1. Use null for unknown fields.\nDescription: {}",
            state.user_input
        );
        let nullable = json!({"type": ["string", "null"]});
        let schema = json!({
            "type": "object",
            "required": ["ingredients"],
            "properties": {
                "ingredients": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": nullable, "size": nullable, "material": nullable,
                            "category": nullable, "condition": nullable,
                            "confidence": {"type": "number", "minimum": 0, "maximum": 1}
                        }
                    }
                }
            }
        });
        let outcome = self
            .ctx
            .call::<ExtractionPayload>(ModelRequest::new(TaskType::Extraction, prompt).with_schema(schema))
            .await;

        let mut update = StateUpdate::new();
        if let Some(err) = fallback_error(EXTRACT, TaskType::Extraction, &outcome) {
            update.push_error(err);
        }
        let ingredients = match outcome {
            ModelOutcome::Success { data } => {
                let list: Vec<Ingredient> = data
                    .ingredients
                    .into_iter()
                    .filter_map(ExtractedIngredient::into_ingredient)
                    .collect();
                if list.is_empty() {
                    update.push_error(WorkflowErrorRecord::recoverable(
                        "extraction_empty",
                        EXTRACT,
                        "model returned no usable ingredients",
                    ));
                }
                list
            }
            ModelOutcome::SchemaError { raw } => salvage(&raw),
            ModelOutcome::ProviderError { .. } => Vec::new(),
        };

        let ingredients = if ingredients.is_empty() {
            vec![fallback_ingredient(&state.user_input)]
        } else {
            ingredients
        };
        tracing::debug!(count = ingredients.len(), "ingredients extracted");
        update.ingredients = Some(ingredients);
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, MockGateway};
    use crate::workflow::nodes::test_support::{ctx, offline};

    /// **Scenario**: A clean reply becomes extracted ingredients with clamped confidence.
    #[tokio::test]
    async fn extracts_from_model_reply() {
        let mock = Arc::new(MockGateway::new().push_response(
            TaskType::Extraction,
            r#"{"ingredients":[{"name":"water bottles","size":"500 ml","material":"plastic","confidence":1.4}]}"#,
        ));
        let update = Extract::new(ctx(mock))
            .execute(&WorkflowState::new("t", "3 plastic water bottles"))
            .await
            .unwrap();
        let list = update.ingredients.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].material.as_deref(), Some("plastic"));
        assert_eq!(list[0].confidence(), 1.0);
        assert!(!list[0].needs_clarification);
        assert!(update.errors.is_empty());
    }

    /// **Scenario**: Provider failure yields one fallback ingredient named after the input, confidence 0.3.
    #[tokio::test]
    async fn provider_failure_uses_fallback_ingredient() {
        let update = Extract::new(offline())
            .execute(&WorkflowState::new("t", "an old guitar"))
            .await
            .unwrap();
        let list = update.ingredients.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name.as_deref(), Some("an old guitar"));
        assert_eq!(list[0].confidence(), FALLBACK_CONFIDENCE);
        assert!(list[0].needs_clarification);
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].recoverable);
    }

    /// **Scenario**: Quota exhaustion also falls back instead of leaving an empty list.
    #[tokio::test]
    async fn quota_failure_never_leaves_empty_list() {
        let mock = Arc::new(
            MockGateway::new()
                .push_error(TaskType::Extraction, GatewayError::QuotaExceeded("limit".into())),
        );
        let update = Extract::new(ctx(mock))
            .execute(&WorkflowState::new("t", "jar"))
            .await
            .unwrap();
        assert_eq!(update.ingredients.unwrap().len(), 1);
    }

    /// **Scenario**: Unparseable replies are salvaged field by field.
    #[tokio::test]
    async fn schema_error_is_salvaged() {
        let broken = r#"{"ingredients":[{"name":"jar","material":"glass","size":"small"},{"name":"cork","material":"cork","size":"tiny""#;
        let mock = Arc::new(MockGateway::new().with_response(TaskType::Extraction, broken));
        let update = Extract::new(ctx(mock))
            .execute(&WorkflowState::new("t", "jar and cork"))
            .await
            .unwrap();
        let list = update.ingredients.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].name.as_deref(), Some("cork"));
        assert_eq!(list[0].material.as_deref(), Some("glass"));
        assert_eq!(update.errors[0].kind, "model_fallback");
    }
}
