//! `choice_generation`: 3 to 5 candidate product ideas.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::Category;
use crate::workflow::outputs::ProductOption;
use crate::workflow::state::WorkflowState;
use crate::workflow::update::StateUpdate;

use super::{describe_ingredients, fallback_error, CHOICE_GENERATION};

pub const MIN_OPTIONS: usize = 3;
pub const MAX_OPTIONS: usize = 5;

#[derive(Debug, Deserialize)]
struct DraftOption {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoicePayload {
    options: Vec<DraftOption>,
}

fn first_label(state: &WorkflowState, category: Category, default: &str) -> String {
    state
        .ingredients
        .iter()
        .find(|i| i.category == Some(category))
        .map(|i| i.label().to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Template ideas built from the container and fastener at hand.
fn template_options(state: &WorkflowState) -> Vec<ProductOption> {
    let container = first_label(state, Category::Container, "container");
    let fastener = first_label(state, Category::Fastener, "string");
    let ideas = [
        (
            format!("Hanging {} planter", container),
            format!("Cut the {} open, add drainage holes and hang it with the {}.", container, fastener),
            vec!["Cut an opening".to_string(), "Punch drainage holes".to_string(), format!("Hang with {}", fastener)],
            "easy",
        ),
        (
            format!("{} desk organizer", container),
            format!("Trim several {} pieces to different heights and bind them with {}.", container, fastener),
            vec!["Trim to height".to_string(), "Sand the edges".to_string(), format!("Bind with {}", fastener)],
            "easy",
        ),
        (
            format!("{} lantern", container),
            format!("Turn the {} into a lantern shade, hung from {}.", container, fastener),
            vec!["Clean and dry".to_string(), "Cut a light pattern".to_string(), "Fit a battery tea light".to_string()],
            "medium",
        ),
    ];
    ideas
        .into_iter()
        .map(|(title, description, steps, difficulty)| {
            let mut option = ProductOption::new(String::new(), title);
            option.description = description;
            option.materials = vec![container.clone(), fastener.clone()];
            option.steps = steps;
            option.difficulty = difficulty.to_string();
            option
        })
        .collect()
}

fn draft_into_option(draft: DraftOption) -> Option<ProductOption> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return None;
    }
    let mut option = ProductOption::new(String::new(), title);
    option.description = draft.description;
    option.materials = draft.materials;
    option.steps = draft.steps;
    if let Some(d) = draft.difficulty.filter(|d| !d.trim().is_empty()) {
        option.difficulty = d.trim().to_lowercase();
    }
    Some(option)
}

/// Truncates to `MAX_OPTIONS`, pads from templates to `MIN_OPTIONS`, numbers the ids.
fn finalize(mut options: Vec<ProductOption>, state: &WorkflowState) -> Vec<ProductOption> {
    options.truncate(MAX_OPTIONS);
    let mut templates = template_options(state).into_iter();
    while options.len() < MIN_OPTIONS {
        match templates.next() {
            Some(t) if !options.iter().any(|o| o.title == t.title) => options.push(t),
            Some(_) => continue,
            None => break,
        }
    }
    for (i, option) in options.iter_mut().enumerate() {
        option.id = format!("opt-{}", i + 1);
    }
    options
}

pub struct ChoiceGeneration {
    ctx: Arc<ExecutorContext>,
}

impl ChoiceGeneration {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for ChoiceGeneration {
    fn id(&self) -> &'static str {
        CHOICE_GENERATION
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let regenerating = !state.candidate_options.is_empty();
        let goal = state
            .goals
            .as_ref()
            .map(|g| g.statement.as_str())
            .unwrap_or("make something useful");
        let mut prompt = format!(
            "Goal: {}\nArtifact type: {}\nMaterials: {}\n\
             Suggest {} to {} distinct build ideas, each with a title, description, \
             materials, steps and difficulty (easy, medium, hard).",
            goal,
            state.artifact_type.as_deref().unwrap_or("any"),
            describe_ingredients(&state.ingredients),
            MIN_OPTIONS,
            MAX_OPTIONS
        );
        if regenerating {
            let rejected: Vec<&str> = state
                .candidate_options
                .iter()
                .map(|o| o.title.as_str())
                .collect();
            prompt.push_str(&format!(
                "\nThese ideas were rejected as unsafe, do not repeat them: {}. \
                 Avoid hazardous chemicals.",
                rejected.join(", ")
            ));
        }
        let schema = json!({
            "type": "object",
            "required": ["options"],
            "properties": {
                "options": {
                    "type": "array",
                    "minItems": MIN_OPTIONS,
                    "maxItems": MAX_OPTIONS,
                    "items": {
                        "type": "object",
                        "required": ["title"],
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"},
                            "materials": {"type": "array", "items": {"type": "string"}},
                            "steps": {"type": "array", "items": {"type": "string"}},
                            "difficulty": {"type": "string"}
                        }
                    }
                }
            }
        });
        let outcome = self
            .ctx
            .call::<ChoicePayload>(ModelRequest::new(TaskType::Creative, prompt).with_schema(schema))
            .await;

        let mut update = StateUpdate::new();
        if let Some(err) = fallback_error(CHOICE_GENERATION, TaskType::Creative, &outcome) {
            update.push_error(err);
        }
        let drafted = match outcome {
            ModelOutcome::Success { data } => data
                .options
                .into_iter()
                .filter_map(draft_into_option)
                .collect(),
            _ => Vec::new(),
        };
        let options = finalize(drafted, state);
        tracing::debug!(count = options.len(), regenerating, "options generated");

        update.candidate_options = Some(options);
        update.viable_options = Some(Vec::new());
        update.selected_option = Some(None);
        if regenerating {
            update.choice_regeneration_count = Some(state.choice_regeneration_count + 1);
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::workflow::ingredient::{Ingredient, IngredientSource};
    use crate::workflow::nodes::test_support::{ctx, offline};

    fn state() -> WorkflowState {
        let mut s = WorkflowState::new("t", "bottles and twine");
        s.ingredients = vec![
            Ingredient::named("bottle", IngredientSource::Extracted, 0.9)
                .with_category(Category::Container),
            Ingredient::named("twine", IngredientSource::Extracted, 0.9)
                .with_category(Category::Fastener),
        ];
        s
    }

    fn reply(count: usize) -> String {
        let options: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"title":"Idea {}","difficulty":"Easy"}}"#, i))
            .collect();
        format!(r#"{{"options":[{}]}}"#, options.join(","))
    }

    /// **Scenario**: More than five model options are truncated to five, ids numbered.
    #[tokio::test]
    async fn truncates_to_five() {
        let mock = Arc::new(MockGateway::new().push_response(TaskType::Creative, reply(7)));
        let update = ChoiceGeneration::new(ctx(mock)).execute(&state()).await.unwrap();
        let options = update.candidate_options.unwrap();
        assert_eq!(options.len(), 5);
        assert_eq!(options[4].id, "opt-5");
        assert_eq!(options[0].difficulty, "easy");
    }

    /// **Scenario**: Fewer than three options are padded from templates.
    #[tokio::test]
    async fn pads_to_three() {
        let mock = Arc::new(MockGateway::new().push_response(TaskType::Creative, reply(1)));
        let update = ChoiceGeneration::new(ctx(mock)).execute(&state()).await.unwrap();
        let options = update.candidate_options.unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].title, "Idea 0");
        assert_eq!(options[1].title, "Hanging bottle planter");
    }

    /// **Scenario**: Offline, template options mention the ingredients at hand.
    #[tokio::test]
    async fn offline_uses_templates() {
        let update = ChoiceGeneration::new(offline()).execute(&state()).await.unwrap();
        let options = update.candidate_options.unwrap();
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.materials.contains(&"twine".to_string())));
        assert!(update.choice_regeneration_count.is_none(), "first entry");
    }

    /// **Scenario**: Re-entry counts a regeneration, names the rejected ideas and resets the selection.
    #[tokio::test]
    async fn reentry_counts_regeneration() {
        let mock = Arc::new(MockGateway::new());
        let mut s = state();
        s.candidate_options = vec![ProductOption::new("opt-1", "Bleach dyed tote")];
        let update = ChoiceGeneration::new(ctx(mock.clone())).execute(&s).await.unwrap();
        assert_eq!(update.choice_regeneration_count, Some(1));
        assert_eq!(update.selected_option, Some(None));
        assert!(mock.calls()[0].prompt.contains("Bleach dyed tote"));
    }
}
