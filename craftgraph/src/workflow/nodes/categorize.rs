//! `categorize`: assign a category to every ingredient and make sure the
//! essential categories are represented.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::{Category, Ingredient, IngredientSource};
use crate::workflow::keywords;
use crate::workflow::state::{Phase, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{fallback_error, CATEGORIZE};

/// Confidence of a synthesized placeholder ingredient.
const PLACEHOLDER_CONFIDENCE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct CategoryPayload {
    categories: Vec<String>,
}

fn heuristic(ingredient: &Ingredient) -> Category {
    let text = format!(
        "{} {}",
        ingredient.name.as_deref().unwrap_or_default(),
        ingredient.material.as_deref().unwrap_or_default()
    );
    keywords::infer_category(&text)
}

fn placeholder(category: Category) -> Ingredient {
    Ingredient::named(category.as_str(), IngredientSource::Derived, PLACEHOLDER_CONFIDENCE)
        .with_category(category)
}

pub struct Categorize {
    ctx: Arc<ExecutorContext>,
}

impl Categorize {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }

    /// Categories for `pending`, from the model when its reply lines up.
    async fn classify(&self, pending: &[&Ingredient], update: &mut StateUpdate) -> Vec<Category> {
        let listing: Vec<String> = pending
            .iter()
            .map(|i| {
                format!(
                    "{} ({})",
                    i.label(),
                    i.material.as_deref().unwrap_or("unknown material")
                )
            })
            .collect();
        let prompt = format!(
            "Assign each item exactly one category out of container, fastener, decorative, \
             tool, other. Answer in the same order.\nItems:\n- {}",
            listing.join("\n- ")
        );
        let schema = json!({
            "type": "object",
            "required": ["categories"],
            "properties": {
                "categories": {
                    "type": "array",
                    "items": {"enum": ["container", "fastener", "decorative", "tool", "other"]}
                }
            }
        });
        let outcome = self
            .ctx
            .call::<CategoryPayload>(
                ModelRequest::new(TaskType::Categorization, prompt).with_schema(schema),
            )
            .await;
        if let Some(err) = fallback_error(CATEGORIZE, TaskType::Categorization, &outcome) {
            update.push_error(err);
        }
        let from_model = match outcome {
            ModelOutcome::Success { data } if data.categories.len() == pending.len() => data
                .categories
                .iter()
                .map(|c| Category::parse(c))
                .collect::<Option<Vec<_>>>(),
            ModelOutcome::Success { data } => {
                tracing::debug!(
                    expected = pending.len(),
                    got = data.categories.len(),
                    "category count mismatch, using keywords"
                );
                None
            }
            _ => None,
        };
        from_model.unwrap_or_else(|| pending.iter().map(|i| heuristic(i)).collect())
    }
}

#[async_trait]
impl NodeExecutor for Categorize {
    fn id(&self) -> &'static str {
        CATEGORIZE
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let mut update = StateUpdate::new();
        let mut ingredients = state.ingredients.clone();

        let pending: Vec<&Ingredient> = state
            .ingredients
            .iter()
            .filter(|i| i.category.is_none())
            .collect();
        if !pending.is_empty() {
            let mut categories = self.classify(&pending, &mut update).await.into_iter();
            for ing in ingredients.iter_mut().filter(|i| i.category.is_none()) {
                ing.category = categories.next();
            }
        }

        let missing: Vec<Category> = Category::ESSENTIAL
            .into_iter()
            .filter(|c| !ingredients.iter().any(|i| i.category == Some(*c)))
            .collect();

        if !missing.is_empty() && !state.placeholders_synthesized {
            tracing::info!(
                thread_id = %state.thread_id,
                missing = ?missing,
                "synthesizing placeholder ingredients"
            );
            ingredients.extend(missing.into_iter().map(placeholder));
            update.ingredients = Some(ingredients);
            update.placeholders_synthesized = Some(true);
            update.extraction_complete = Some(false);
            return Ok(update);
        }

        update.ingredients = Some(ingredients);
        update.extraction_complete = Some(true);
        update.phase = Some(Phase::GoalFormation);
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::workflow::ingredient::IngredientField;
    use crate::workflow::nodes::test_support::{ctx, offline};

    fn state_with(list: Vec<Ingredient>) -> WorkflowState {
        let mut s = WorkflowState::new("t", "x");
        s.ingredients = list;
        s
    }

    fn complete(name: &str, material: &str) -> Ingredient {
        Ingredient::named(name, IngredientSource::Extracted, 0.9)
            .with_material(material)
            .with_size("medium")
    }

    /// **Scenario**: With both essential categories present, discovery completes.
    #[tokio::test]
    async fn essentials_present_completes_discovery() {
        let mock = Arc::new(MockGateway::new().push_response(
            TaskType::Categorization,
            r#"{"categories":["container","fastener"]}"#,
        ));
        let s = state_with(vec![complete("bottle", "plastic"), complete("twine", "jute")]);
        let update = Categorize::new(ctx(mock)).execute(&s).await.unwrap();
        assert_eq!(update.extraction_complete, Some(true));
        assert_eq!(update.phase, Some(Phase::GoalFormation));
        let list = update.ingredients.unwrap();
        assert_eq!(list[1].category, Some(Category::Fastener));
    }

    /// **Scenario**: A missing fastener is synthesized once, as a derived placeholder missing size and material.
    #[tokio::test]
    async fn missing_fastener_is_synthesized() {
        let s = state_with(vec![complete("water bottles", "plastic")]);
        let update = Categorize::new(offline()).execute(&s).await.unwrap();
        assert_eq!(update.placeholders_synthesized, Some(true));
        assert_eq!(update.extraction_complete, Some(false));
        assert!(update.phase.is_none());
        let list = update.ingredients.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].category, Some(Category::Container), "keyword fallback");
        let added = &list[1];
        assert_eq!(added.source, IngredientSource::Derived);
        assert_eq!(added.category, Some(Category::Fastener));
        assert_eq!(added.name.as_deref(), Some("fastener"));
        assert_eq!(added.first_missing(), Some(IngredientField::Material));
    }

    /// **Scenario**: After placeholders were synthesized, a still-missing category does not block progress.
    #[tokio::test]
    async fn synthesized_once_then_proceeds() {
        let mut s = state_with(vec![complete("spoon", "steel")]);
        s.placeholders_synthesized = true;
        let update = Categorize::new(offline()).execute(&s).await.unwrap();
        assert_eq!(update.extraction_complete, Some(true));
        assert_eq!(update.phase, Some(Phase::GoalFormation));
    }

    /// **Scenario**: A model reply with the wrong count falls back to keywords; known categories are kept.
    #[tokio::test]
    async fn count_mismatch_uses_keywords() {
        let mock = Arc::new(MockGateway::new().push_response(
            TaskType::Categorization,
            r#"{"categories":["tool","tool","tool"]}"#,
        ));
        let s = state_with(vec![
            complete("jar", "glass").with_category(Category::Decorative),
            complete("twine", "jute"),
        ]);
        let update = Categorize::new(ctx(mock.clone())).execute(&s).await.unwrap();
        let list = update.ingredients.unwrap();
        assert_eq!(list[0].category, Some(Category::Decorative));
        assert_eq!(list[1].category, Some(Category::Fastener));
        assert_eq!(mock.call_count(TaskType::Categorization), 1);
    }
}
