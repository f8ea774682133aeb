//! Routers of the conditional exits and their path maps.
//!
//! Each router is a pure function of the state the node just returned. Exit
//! names are the keys of the matching `*_PATHS` table.

use super::nodes::{
    ASK_USER, CATEGORIZE, CHOICE_GENERATION, GOAL_FORMATION, IMAGE_GENERATE, NULL_CHECK,
    PACKAGING, PROMPT_BUILD,
};
use super::state::{Phase, WorkflowState};

pub const EXIT_ASK_USER: &str = "ask_user";
pub const EXIT_CATEGORIZE: &str = "categorize";
pub const EXIT_COMPLETE: &str = "complete";
pub const EXIT_RECHECK: &str = "recheck";
pub const EXIT_REGENERATE: &str = "regenerate";
pub const EXIT_PROCEED: &str = "proceed";
pub const EXIT_NEXT_VARIANT: &str = "next_variant";
pub const EXIT_ASSEMBLE: &str = "assemble";

pub const NULL_CHECK_PATHS: [(&str, &str); 2] =
    [(EXIT_ASK_USER, ASK_USER), (EXIT_CATEGORIZE, CATEGORIZE)];
pub const CATEGORIZE_PATHS: [(&str, &str); 2] =
    [(EXIT_COMPLETE, GOAL_FORMATION), (EXIT_RECHECK, NULL_CHECK)];
pub const EVALUATION_PATHS: [(&str, &str); 2] = [
    (EXIT_REGENERATE, CHOICE_GENERATION),
    (EXIT_PROCEED, PROMPT_BUILD),
];
pub const IMAGE_PATHS: [(&str, &str); 2] = [
    (EXIT_NEXT_VARIANT, IMAGE_GENERATE),
    (EXIT_ASSEMBLE, PACKAGING),
];

/// `ask_user` while a question is outstanding, else `categorize`.
pub fn route_after_null_check(state: &WorkflowState) -> String {
    if state.needs_user_input {
        EXIT_ASK_USER
    } else {
        EXIT_CATEGORIZE
    }
    .to_string()
}

/// Back to `null_check` after placeholders were added.
pub fn route_after_categorize(state: &WorkflowState) -> String {
    if state.extraction_complete {
        EXIT_COMPLETE
    } else {
        EXIT_RECHECK
    }
    .to_string()
}

/// `regenerate` only while evaluation stayed in goal formation without a pick.
pub fn route_after_evaluation(state: &WorkflowState) -> String {
    if state.phase == Phase::GoalFormation && state.selected_option.is_none() {
        EXIT_REGENERATE
    } else {
        EXIT_PROCEED
    }
    .to_string()
}

pub fn route_after_image(state: &WorkflowState, iteration_ceiling: u32) -> String {
    let pending = state.concept_variants.iter().any(|v| v.is_pending());
    if pending && state.image_iterations < iteration_ceiling {
        EXIT_NEXT_VARIANT
    } else {
        EXIT_ASSEMBLE
    }
    .to_string()
}
