//! Workflow state: the one record that flows through every node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ingredient::{Ingredient, IngredientField};
use super::outputs::{
    ConceptVariant, ExportBundle, Goals, ProductOption, ProductPackage, ShareCard,
    WorkflowAnalytics,
};

/// Coarse stage of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    GoalFormation,
    ConceptGeneration,
    OutputAssembly,
    Complete,
    Error,
}

impl Phase {
    fn rank(self) -> u8 {
        match self {
            Phase::Discovery => 0,
            Phase::GoalFormation => 1,
            Phase::ConceptGeneration => 2,
            Phase::OutputAssembly => 3,
            Phase::Complete => 4,
            Phase::Error => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }

    /// Next phase if moving to `target` is allowed: forward only, `Error` from
    /// anywhere non-terminal, nothing out of a terminal phase.
    pub fn advance_to(self, target: Phase) -> Option<Phase> {
        if self.is_terminal() || target == self {
            return None;
        }
        if target == Phase::Error || target.rank() > self.rank() {
            Some(target)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::GoalFormation => "goal_formation",
            Phase::ConceptGeneration => "concept_generation",
            Phase::OutputAssembly => "output_assembly",
            Phase::Complete => "complete",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outstanding clarification question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub ingredient_index: usize,
    pub field: IngredientField,
    pub text: String,
}

/// Entry of the append-only error trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowErrorRecord {
    pub kind: String,
    pub message: String,
    pub node: String,
    pub timestamp: DateTime<Utc>,
    pub recoverable: bool,
}

impl WorkflowErrorRecord {
    pub fn recoverable(kind: impl Into<String>, node: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            node: node.to_string(),
            timestamp: Utc::now(),
            recoverable: true,
        }
    }

    pub fn fatal(kind: impl Into<String>, node: &str, message: impl Into<String>) -> Self {
        Self {
            recoverable: false,
            ..Self::recoverable(kind, node, message)
        }
    }
}

/// State of one workflow instance, keyed by `thread_id`.
///
/// Mutated only by merging node updates (`WorkflowState::apply`); saved after
/// every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub thread_id: String,
    pub phase: Phase,
    /// Last executed node.
    pub node: String,
    pub user_input: String,

    pub ingredients: Vec<Ingredient>,
    pub extraction_complete: bool,
    pub placeholders_synthesized: bool,

    pub goals: Option<Goals>,
    pub artifact_type: Option<String>,
    pub candidate_options: Vec<ProductOption>,
    pub viable_options: Vec<ProductOption>,
    pub selected_option: Option<ProductOption>,
    pub concept_variants: Vec<ConceptVariant>,
    pub final_package: Option<ProductPackage>,
    pub export: Option<ExportBundle>,
    pub analytics: Option<WorkflowAnalytics>,
    pub share: Option<ShareCard>,

    pub needs_user_input: bool,
    pub user_questions: Vec<String>,
    pub pending_question: Option<PendingQuestion>,
    pub pending_answer: Option<String>,

    pub errors: Vec<WorkflowErrorRecord>,

    pub retry_count: u32,
    pub clarification_retry_count: u32,
    /// Questions asked over the whole run; never reset.
    pub clarification_rounds: u32,
    pub choice_regeneration_count: u32,
    pub image_iterations: u32,

    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Fresh state in the discovery phase.
    pub fn new(thread_id: impl Into<String>, user_input: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            phase: Phase::Discovery,
            node: String::new(),
            user_input: user_input.into(),
            ingredients: Vec::new(),
            extraction_complete: false,
            placeholders_synthesized: false,
            goals: None,
            artifact_type: None,
            candidate_options: Vec::new(),
            viable_options: Vec::new(),
            selected_option: None,
            concept_variants: Vec::new(),
            final_package: None,
            export: None,
            analytics: None,
            share: None,
            needs_user_input: false,
            user_questions: Vec::new(),
            pending_question: None,
            pending_answer: None,
            errors: Vec::new(),
            retry_count: 0,
            clarification_retry_count: 0,
            clarification_rounds: 0,
            choice_regeneration_count: 0,
            image_iterations: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Suspended in `ask_user` waiting for an answer.
    pub fn is_waiting_for_input(&self) -> bool {
        self.needs_user_input && self.pending_question.is_some() && self.pending_answer.is_none()
    }

    /// First `(ingredient index, field)` still missing, ingredients in order.
    pub fn first_missing_field(&self) -> Option<(usize, IngredientField)> {
        self.ingredients
            .iter()
            .enumerate()
            .find_map(|(i, ing)| ing.first_missing().map(|f| (i, f)))
    }

    pub fn has_error(&self, kind: &str) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Checks the cross-field invariants every reachable state must satisfy.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(bad) = self
            .ingredients
            .iter()
            .find(|i| !(0.0..=1.0).contains(&i.confidence()))
        {
            return Err(format!(
                "ingredient '{}' has confidence {} outside [0, 1]",
                bad.label(),
                bad.confidence()
            ));
        }
        if !self.user_questions.is_empty() && !self.needs_user_input {
            return Err("user questions present while needs_user_input is false".to_string());
        }
        if let Some(q) = &self.pending_question {
            if q.ingredient_index >= self.ingredients.len() {
                return Err(format!(
                    "pending question targets ingredient {} of {}",
                    q.ingredient_index,
                    self.ingredients.len()
                ));
            }
        }
        if let Some(selected) = &self.selected_option {
            if selected.safety_check == Some(false) {
                return Err(format!("unsafe option '{}' is selected", selected.id));
            }
        }
        Ok(())
    }
}
