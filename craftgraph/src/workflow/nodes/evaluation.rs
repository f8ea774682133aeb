//! `evaluation`: safety veto, scoring and selection.
//!
//! The veto is local: an option whose text names a hazardous combination or
//! material gets `safety_check = Some(false)` before any score is looked at,
//! and is never selected.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::clamp_confidence;
use crate::workflow::keywords;
use crate::workflow::outputs::ProductOption;
use crate::workflow::state::{Phase, WorkflowErrorRecord, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{fallback_error, EVALUATION};

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    id: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ScorePayload {
    scores: Vec<ScoreEntry>,
}

/// Marks every option safe or vetoed.
pub fn apply_safety_veto(options: &mut [ProductOption]) {
    for option in options.iter_mut() {
        let hazards = keywords::hazards_in(&option.searchable_text());
        option.safety_check = Some(hazards.is_empty());
        option.safety_notes = hazards;
    }
}

/// Offline score: ingredient overlap and ease.
fn heuristic_score(option: &ProductOption, state: &WorkflowState) -> f32 {
    let text = option.searchable_text();
    let overlap = state
        .ingredients
        .iter()
        .filter(|i| {
            let name_hit = i
                .name
                .as_deref()
                .map(|n| keywords::contains_phrase(&text, n))
                .unwrap_or(false);
            let material_hit = i
                .material
                .as_deref()
                .map(|m| keywords::contains_phrase(&text, m))
                .unwrap_or(false);
            name_hit || material_hit
        })
        .count();
    let ease = if option.difficulty == "easy" { 0.1 } else { 0.0 };
    clamp_confidence(0.5 + 0.1 * overlap as f32 + ease)
}

pub struct Evaluation {
    ctx: Arc<ExecutorContext>,
}

impl Evaluation {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }

    /// Scores by option id; `None` when the model reply does not cover every option.
    async fn model_scores(
        &self,
        state: &WorkflowState,
        options: &[ProductOption],
        update: &mut StateUpdate,
    ) -> Option<HashMap<String, f32>> {
        let listing: Vec<String> = options
            .iter()
            .map(|o| format!("{}: {} ({}) {}", o.id, o.title, o.difficulty, o.description))
            .collect();
        let prompt = format!(
            "Goal: {}\nRate each idea from 0 to 1 for feasibility with the available materials, \
             usefulness and appeal.\n{}",
            state
                .goals
                .as_ref()
                .map(|g| g.statement.as_str())
                .unwrap_or("make something useful"),
            listing.join("\n")
        );
        let schema = json!({
            "type": "object",
            "required": ["scores"],
            "properties": {
                "scores": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id", "score"],
                        "properties": {
                            "id": {"type": "string"},
                            "score": {"type": "number", "minimum": 0, "maximum": 1}
                        }
                    }
                }
            }
        });
        let outcome = self
            .ctx
            .call::<ScorePayload>(ModelRequest::new(TaskType::Analysis, prompt).with_schema(schema))
            .await;
        if let Some(err) = fallback_error(EVALUATION, TaskType::Analysis, &outcome) {
            update.push_error(err);
        }
        let ModelOutcome::Success { data } = outcome else {
            return None;
        };
        let scores: HashMap<String, f32> = data
            .scores
            .into_iter()
            .map(|s| (s.id, clamp_confidence(s.score)))
            .collect();
        options
            .iter()
            .all(|o| scores.contains_key(&o.id))
            .then_some(scores)
    }
}

#[async_trait]
impl NodeExecutor for Evaluation {
    fn id(&self) -> &'static str {
        EVALUATION
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let mut update = StateUpdate::new();
        let mut options = state.candidate_options.clone();
        apply_safety_veto(&mut options);

        let scores = self.model_scores(state, &options, &mut update).await;
        for option in options.iter_mut() {
            option.score = Some(match scores.as_ref().and_then(|s| s.get(&option.id)) {
                Some(score) => *score,
                None => heuristic_score(option, state),
            });
        }

        let mut viable: Vec<ProductOption> = options.iter().filter(|o| o.is_safe()).cloned().collect();
        viable.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
        });
        update.candidate_options = Some(options);

        if viable.is_empty() {
            let limit = self.ctx.config.max_choice_regenerations;
            update.viable_options = Some(Vec::new());
            update.selected_option = Some(None);
            if state.choice_regeneration_count < limit {
                tracing::warn!(
                    thread_id = %state.thread_id,
                    regenerations = state.choice_regeneration_count,
                    "every option vetoed, regenerating"
                );
                update.push_error(WorkflowErrorRecord::recoverable(
                    "all_options_blocked",
                    EVALUATION,
                    "every candidate option failed the safety check",
                ));
                return Ok(update);
            }
            tracing::warn!(thread_id = %state.thread_id, "no safe option after regeneration budget");
            update.push_error(WorkflowErrorRecord::recoverable(
                "no_safe_option",
                EVALUATION,
                format!(
                    "every candidate option failed the safety check after {} regenerations",
                    limit
                ),
            ));
            update.phase = Some(Phase::ConceptGeneration);
            return Ok(update);
        }

        let best = viable[0].clone();
        tracing::info!(option = %best.id, title = %best.title, score = ?best.score, "option selected");
        update.viable_options = Some(viable);
        update.selected_option = Some(Some(best));
        update.phase = Some(Phase::ConceptGeneration);
        Ok(update)
    }
}
