//! Partial state update returned by node executors, and its merge.

use chrono::Utc;

use super::ingredient::Ingredient;
use super::outputs::{
    ConceptVariant, ExportBundle, Goals, ProductOption, ProductPackage, ShareCard,
    WorkflowAnalytics,
};
use super::state::{Phase, PendingQuestion, WorkflowErrorRecord, WorkflowState};

/// Fields a node wants to change. `None` leaves a field untouched; for
/// optional state fields `Some(None)` clears them. `errors` are appended.
/// `phase` only ever moves forward (see `Phase::advance_to`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub phase: Option<Phase>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub extraction_complete: Option<bool>,
    pub placeholders_synthesized: Option<bool>,
    pub goals: Option<Goals>,
    pub artifact_type: Option<String>,
    pub candidate_options: Option<Vec<ProductOption>>,
    pub viable_options: Option<Vec<ProductOption>>,
    pub selected_option: Option<Option<ProductOption>>,
    pub concept_variants: Option<Vec<ConceptVariant>>,
    pub final_package: Option<ProductPackage>,
    pub export: Option<ExportBundle>,
    pub analytics: Option<WorkflowAnalytics>,
    pub share: Option<ShareCard>,
    pub needs_user_input: Option<bool>,
    pub user_questions: Option<Vec<String>>,
    pub pending_question: Option<Option<PendingQuestion>>,
    pub pending_answer: Option<Option<String>>,
    pub errors: Vec<WorkflowErrorRecord>,
    pub retry_count: Option<u32>,
    pub clarification_retry_count: Option<u32>,
    pub clarification_rounds: Option<u32>,
    pub choice_regeneration_count: Option<u32>,
    pub image_iterations: Option<u32>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, record: WorkflowErrorRecord) -> Self {
        self.errors.push(record);
        self
    }

    pub fn push_error(&mut self, record: WorkflowErrorRecord) {
        self.errors.push(record);
    }

    /// Clears every field of the interrupt protocol.
    pub fn clear_interrupt(mut self) -> Self {
        self.needs_user_input = Some(false);
        self.user_questions = Some(Vec::new());
        self.pending_question = Some(None);
        self.pending_answer = Some(None);
        self
    }
}

impl WorkflowState {
    /// Merges `update` into the state.
    ///
    /// A phase advance resets `retry_count` and `clarification_retry_count`.
    /// A backwards phase in the update is ignored.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            phase,
            ingredients,
            extraction_complete,
            placeholders_synthesized,
            goals,
            artifact_type,
            candidate_options,
            viable_options,
            selected_option,
            concept_variants,
            final_package,
            export,
            analytics,
            share,
            needs_user_input,
            user_questions,
            pending_question,
            pending_answer,
            errors,
            retry_count,
            clarification_retry_count,
            clarification_rounds,
            choice_regeneration_count,
            image_iterations,
        } = update;

        if let Some(v) = ingredients {
            self.ingredients = v;
        }
        if let Some(v) = extraction_complete {
            self.extraction_complete = v;
        }
        if let Some(v) = placeholders_synthesized {
            self.placeholders_synthesized = v;
        }
        if let Some(v) = goals {
            self.goals = Some(v);
        }
        if let Some(v) = artifact_type {
            self.artifact_type = Some(v);
        }
        if let Some(v) = candidate_options {
            self.candidate_options = v;
        }
        if let Some(v) = viable_options {
            self.viable_options = v;
        }
        if let Some(v) = selected_option {
            self.selected_option = v;
        }
        if let Some(v) = concept_variants {
            self.concept_variants = v;
        }
        if let Some(v) = final_package {
            self.final_package = Some(v);
        }
        if let Some(v) = export {
            self.export = Some(v);
        }
        if let Some(v) = analytics {
            self.analytics = Some(v);
        }
        if let Some(v) = share {
            self.share = Some(v);
        }
        if let Some(v) = needs_user_input {
            self.needs_user_input = v;
        }
        if let Some(v) = user_questions {
            self.user_questions = v;
        }
        if let Some(v) = pending_question {
            self.pending_question = v;
        }
        if let Some(v) = pending_answer {
            self.pending_answer = v;
        }
        self.errors.extend(errors);
        if let Some(v) = retry_count {
            self.retry_count = v;
        }
        if let Some(v) = clarification_retry_count {
            self.clarification_retry_count = v;
        }
        if let Some(v) = clarification_rounds {
            self.clarification_rounds = v;
        }
        if let Some(v) = choice_regeneration_count {
            self.choice_regeneration_count = v;
        }
        if let Some(v) = image_iterations {
            self.image_iterations = v;
        }

        if let Some(next) = phase.and_then(|p| self.phase.advance_to(p)) {
            self.phase = next;
            self.retry_count = 0;
            self.clarification_retry_count = 0;
        }
        self.updated_at = Utc::now();
    }
}
