//! `ask_user`: the interrupt point of the clarification loop.
//!
//! First entry (no answer yet) counts the question and suspends the run. When
//! the orchestrator resumes with the user's answer in `pending_answer`, the
//! answer is applied to the pending question and the loop returns to
//! `null_check`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::workflow::clarification::{apply_clarification, ClarificationTier};
use crate::workflow::executor::{ExecutorContext, ExecutorFault, NodeExecutor};
use crate::workflow::state::{WorkflowErrorRecord, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::ASK_USER;

pub struct AskUser {
    ctx: Arc<ExecutorContext>,
}

impl AskUser {
    pub fn new(ctx: Arc<ExecutorContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl NodeExecutor for AskUser {
    fn id(&self) -> &'static str {
        ASK_USER
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let Some(question) = &state.pending_question else {
            return Ok(StateUpdate::new().clear_interrupt());
        };

        let Some(answer) = &state.pending_answer else {
            return Ok(StateUpdate {
                needs_user_input: Some(true),
                clarification_retry_count: Some(state.clarification_retry_count + 1),
                clarification_rounds: Some(state.clarification_rounds + 1),
                ..StateUpdate::new()
            });
        };

        let outcome = apply_clarification(&self.ctx, &state.ingredients, question, answer).await;
        tracing::info!(
            thread_id = %state.thread_id,
            field = %question.field,
            tier = ?outcome.tier,
            "clarification applied"
        );
        let mut update = StateUpdate::new().clear_interrupt();
        if outcome.tier == ClarificationTier::Unchanged {
            update.push_error(WorkflowErrorRecord::recoverable(
                "clarification_unresolved",
                ASK_USER,
                format!(
                    "answer {:?} did not supply the {} of item #{}",
                    answer,
                    question.field,
                    question.ingredient_index + 1
                ),
            ));
        }
        update.ingredients = Some(outcome.ingredients);
        Ok(update)
    }

    fn suspend_after(&self, state: &WorkflowState) -> bool {
        state.is_waiting_for_input()
    }
}
