use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::Category;
use crate::workflow::outputs::Goals;
use crate::workflow::state::{Phase, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{describe_ingredients, fallback_error, GOAL_FORMATION};

#[derive(Debug, Deserialize)]
struct GoalPayload {
    statement: String,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default)]
    audience: String,
    artifact_type: String,
}

/// Goals derived from the ingredients alone.
fn derived_goals(state: &WorkflowState) -> (Goals, String) {
    let has_container = state
        .ingredients
        .iter()
        .any(|i| i.category == Some(Category::Container));
    let artifact_type = if has_container {
        "storage organizer"
    } else {
        "upcycled craft"
    };
    let goals = Goals {
        statement: format!(
            "Turn {} into a useful {}",
            describe_ingredients(&state.ingredients),
            artifact_type
        ),
        constraints: vec![
            "use only the listed materials plus common household tools".to_string(),
            "no hazardous chemicals".to_string(),
        ],
        audience: "home crafters".to_string(),
    };
    (goals, artifact_type.to_string())
}

/// `goal_formation`: what should be built from the ingredients.
pub struct GoalFormation {
    ctx: Arc<ExecutorContext>,
}

impl GoalFormation {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for GoalFormation {
    fn id(&self) -> &'static str {
        GOAL_FORMATION
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let prompt = format!(
            "A maker has these materials: {}.\nOriginal description: {}\n\
             Propose one project goal: a statement, a few constraints, the intended audience \
             and the kind of artifact (for example \"planter\", \"lamp\", \"organizer\").",
            describe_ingredients(&state.ingredients),
            state.user_input
        );
        let schema = json!({
            "type": "object",
            "required": ["statement", "artifact_type"],
            "properties": {
                "statement": {"type": "string"},
                "constraints": {"type": "array", "items": {"type": "string"}},
                "audience": {"type": "string"},
                "artifact_type": {"type": "string"}
            }
        });
        let outcome = self
            .ctx
            .call::<GoalPayload>(ModelRequest::new(TaskType::GoalFormation, prompt).with_schema(schema))
            .await;

        let mut update = StateUpdate {
            phase: Some(Phase::GoalFormation),
            ..StateUpdate::new()
        };
        if let Some(err) = fallback_error(GOAL_FORMATION, TaskType::GoalFormation, &outcome) {
            update.push_error(err);
        }
        let (goals, artifact_type) = match outcome {
            ModelOutcome::Success { data }
                if !data.statement.trim().is_empty() && !data.artifact_type.trim().is_empty() =>
            {
                (
                    Goals {
                        statement: data.statement.trim().to_string(),
                        constraints: data.constraints,
                        audience: data.audience,
                    },
                    data.artifact_type.trim().to_lowercase(),
                )
            }
            _ => derived_goals(state),
        };
        update.goals = Some(goals);
        update.artifact_type = Some(artifact_type);
        Ok(update)
    }
}
