//! `null_check`: find the first missing required field and ask about it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::IngredientField;
use crate::workflow::state::{PendingQuestion, WorkflowErrorRecord, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{fallback_error, NULL_CHECK};

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    question: String,
}

/// Deterministic question for `field`; always mentions the field by name.
pub fn template_question(index: usize, label: &str, field: IngredientField) -> String {
    match field {
        IngredientField::Name => format!(
            "Item {} in your list has no name yet. What is the name of this item?",
            index + 1
        ),
        IngredientField::Material => format!("What material is the {} made of?", label),
        IngredientField::Size => format!(
            "What size is the {} (for example small, large, or a measurement like 500 ml)?",
            label
        ),
    }
}

pub struct NullCheck {
    ctx: Arc<ExecutorContext>,
}

impl NullCheck {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }

    async fn question_for(
        &self,
        state: &WorkflowState,
        index: usize,
        field: IngredientField,
    ) -> (String, Option<WorkflowErrorRecord>) {
        let label = state.ingredients[index].label().to_string();
        let prompt = format!(
            "We are collecting details about these materials: {}.\n\
             Write one short, friendly question asking for the {} of item #{} (\"{}\"). \
             The question must mention the word \"{}\".",
            super::describe_ingredients(&state.ingredients),
            field,
            index + 1,
            label,
            field
        );
        let schema = json!({
            "type": "object",
            "required": ["question"],
            "properties": {"question": {"type": "string"}}
        });
        let outcome = self
            .ctx
            .call::<QuestionPayload>(
                ModelRequest::new(TaskType::QuestionGeneration, prompt).with_schema(schema),
            )
            .await;
        let error = fallback_error(NULL_CHECK, TaskType::QuestionGeneration, &outcome);
        let question = match outcome {
            ModelOutcome::Success { data }
                if data.question.to_lowercase().contains(field.as_str()) =>
            {
                data.question.trim().to_string()
            }
            _ => template_question(index, &label, field),
        };
        (question, error)
    }
}

#[async_trait]
impl NodeExecutor for NullCheck {
    fn id(&self) -> &'static str {
        NULL_CHECK
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let Some((index, field)) = state.first_missing_field() else {
            return Ok(StateUpdate::new().clear_interrupt());
        };

        let limit = self.ctx.config.max_clarifications;
        if state.clarification_retry_count >= limit {
            tracing::info!(
                thread_id = %state.thread_id,
                asked = state.clarification_retry_count,
                "clarification budget exhausted, proceeding with available data"
            );
            return Ok(StateUpdate::new().clear_interrupt().with_error(
                WorkflowErrorRecord::recoverable(
                    "clarification_budget_exhausted",
                    NULL_CHECK,
                    format!(
                        "{} of item #{} still unknown after {} questions",
                        field,
                        index + 1,
                        limit
                    ),
                ),
            ));
        }

        let (text, error) = self.question_for(state, index, field).await;
        let mut update = StateUpdate {
            needs_user_input: Some(true),
            user_questions: Some(vec![text.clone()]),
            pending_question: Some(Some(PendingQuestion {
                ingredient_index: index,
                field,
                text,
            })),
            pending_answer: Some(None),
            ..StateUpdate::new()
        };
        if let Some(err) = error {
            update.push_error(err);
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

    fn state_with(ingredient: Ingredient) -> WorkflowState {
        let mut s = WorkflowState::new("t", "a bottle");
        s.ingredients.push(ingredient);
        s
    }

    /// **Scenario**: Complete ingredients produce no question and clear the interrupt fields.
    #[tokio::test]
    async fn complete_ingredients_ask_nothing() {
        let s = state_with(
            Ingredient::named("bottle", IngredientSource::Extracted, 0.9)
                .with_material("plastic")
                .with_size("500 ml"),
        );
        let update = NullCheck::new(offline()).execute(&s).await.unwrap();
        assert_eq!(update.needs_user_input, Some(false));
        assert_eq!(update.user_questions, Some(vec![]));
    }

    /// **Scenario**: Missing material yields exactly one question mentioning "material".
    #[tokio::test]
    async fn missing_material_asks_one_question() {
        let s = state_with(Ingredient::named("bottle", IngredientSource::Extracted, 0.7));
        let update = NullCheck::new(offline()).execute(&s).await.unwrap();
        let questions = update.user_questions.unwrap();
        assert_eq!(questions.len(), 1);
        assert!(questions[0].contains("material"), "{}", questions[0]);
        assert_eq!(update.needs_user_input, Some(true));
        let pending = update.pending_question.unwrap().unwrap();
        assert_eq!(pending.field, IngredientField::Material);
        assert_eq!(pending.ingredient_index, 0);
    }

    /// **Scenario**: A model question that does not mention the field is replaced by the template.
    #[tokio::test]
    async fn off_topic_model_question_uses_template() {
        let mock = Arc::new(MockGateway::new().push_response(
            TaskType::QuestionGeneration,
            r#"{"question":"How old is it?"}"#,
        ));
        let s = state_with(Ingredient::named("bottle", IngredientSource::Extracted, 0.7));
        let update = NullCheck::new(ctx(mock)).execute(&s).await.unwrap();
        assert_eq!(
            update.user_questions.unwrap()[0],
            "What material is the bottle made of?"
        );
        assert!(update.errors.is_empty(), "valid reply, only off-topic");
    }

    /// **Scenario**: A model question that mentions the field is used as is.
    #[tokio::test]
    async fn on_topic_model_question_is_used() {
        let mock = Arc::new(MockGateway::new().push_response(
            TaskType::QuestionGeneration,
            r#"{"question":"Which material is your bottle?"}"#,
        ));
        let s = state_with(Ingredient::named("bottle", IngredientSource::Extracted, 0.7));
        let update = NullCheck::new(ctx(mock)).execute(&s).await.unwrap();
        assert_eq!(update.user_questions.unwrap()[0], "Which material is your bottle?");
    }

    /// **Scenario**: With the budget spent, null_check proceeds and records why.
    #[tokio::test]
    async fn exhausted_budget_proceeds() {
        let mut s = state_with(Ingredient::named("bottle", IngredientSource::Extracted, 0.7));
        s.clarification_retry_count = 3;
        let update = NullCheck::new(offline()).execute(&s).await.unwrap();
        assert_eq!(update.needs_user_input, Some(false));
        assert_eq!(update.errors[0].kind, "clarification_budget_exhausted");
    }
}
