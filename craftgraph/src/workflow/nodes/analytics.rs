use async_trait::async_trait;
use chrono::Utc;

use crate::workflow::executor::{ExecutorFault, NodeExecutor};
use crate::workflow::outputs::WorkflowAnalytics;
use crate::workflow::state::WorkflowState;
use crate::workflow::update::StateUpdate;

use super::ANALYTICS;

/// Run statistics as of `state`.
pub fn summarize(state: &WorkflowState) -> WorkflowAnalytics {
    let ingredient_count = state.ingredients.len();
    let mean_confidence = if ingredient_count == 0 {
        0.0
    } else {
        state.ingredients.iter().map(|i| i.confidence()).sum::<f32>() / ingredient_count as f32
    };
    WorkflowAnalytics {
        duration_secs: (Utc::now() - state.started_at).num_seconds().max(0),
        ingredient_count,
        mean_confidence,
        clarification_rounds: state.clarification_rounds,
        choice_regenerations: state.choice_regeneration_count,
        error_count: state.errors.len(),
        placeholder_images: state
            .concept_variants
            .iter()
            .filter(|v| v.image.as_ref().map(|i| i.placeholder).unwrap_or(true))
            .count(),
    }
}

pub struct Analytics;

#[async_trait]
impl NodeExecutor for Analytics {
    fn id(&self) -> &'static str {
        ANALYTICS
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let analytics = summarize(state);
        tracing::info!(
            thread_id = %state.thread_id,
            duration_secs = analytics.duration_secs,
            errors = analytics.error_count,
            placeholders = analytics.placeholder_images,
            "workflow analytics"
        );
        Ok(StateUpdate {
            analytics: Some(analytics),
            ..StateUpdate::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ingredient::{Ingredient, IngredientSource};
    use crate::workflow::state::WorkflowErrorRecord;

    /// **Scenario**: Counts and mean confidence reflect the state.
    #[test]
    fn summarizes_state() {
        let mut s = WorkflowState::new("t", "x");
        s.ingredients = vec![
            Ingredient::named("a", IngredientSource::User, 0.2),
            Ingredient::named("b", IngredientSource::User, 0.6),
        ];
        s.clarification_rounds = 2;
        s.errors.push(WorkflowErrorRecord::recoverable("k", "extract", "m"));
        let a = summarize(&s);
        assert_eq!(a.ingredient_count, 2);
        assert!((a.mean_confidence - 0.4).abs() < 1e-6);
        assert_eq!(a.clarification_rounds, 2);
        assert_eq!(a.error_count, 1);
        assert!(a.duration_secs >= 0);
    }
}
