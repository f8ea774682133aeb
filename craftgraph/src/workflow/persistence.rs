//! Checkpointer setup for workflow state: TTL policy and fragment mirrors.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::memory::{load_fragment, Store, StoreCheckpointer, StoreError};

use super::config::WorkflowConfig;
use super::ingredient::Ingredient;
use super::outputs::{Goals, ProductPackage};
use super::state::{Phase, WorkflowState};

pub const INGREDIENTS_FRAGMENT: &str = "ingredients";
pub const GOALS_FRAGMENT: &str = "goals";
pub const CHOICES_FRAGMENT: &str = "choices";
pub const PACKAGE_FRAGMENT: &str = "package";

/// Fragment mirrors of `state`. Outputs not computed yet map to `None`.
fn fragments(state: &WorkflowState) -> Vec<(&'static str, Option<Value>)> {
    let choices = (!state.candidate_options.is_empty()).then(|| {
        json!({
            "candidates": state.candidate_options,
            "selected": state.selected_option,
        })
    });
    vec![
        (INGREDIENTS_FRAGMENT, Some(json!(state.ingredients))),
        (GOALS_FRAGMENT, state.goals.as_ref().map(|g| json!(g))),
        (CHOICES_FRAGMENT, choices),
        (PACKAGE_FRAGMENT, state.final_package.as_ref().map(|p| json!(p))),
    ]
}

/// Checkpointer for workflow state over `store`.
///
/// Completed workflows are kept for `completed_ttl`, everything else for
/// `checkpoint_ttl`.
pub fn workflow_checkpointer(
    store: Arc<dyn Store>,
    config: &WorkflowConfig,
) -> StoreCheckpointer<WorkflowState> {
    let active = config.checkpoint_ttl;
    let completed = config.completed_ttl;
    StoreCheckpointer::new(store)
        .with_ttl_policy(move |s: &WorkflowState| {
            if s.phase == Phase::Complete {
                completed
            } else {
                active
            }
        })
        .with_fragments(fragments)
}

/// Ingredients mirror of a thread; `None` until written.
pub async fn load_ingredients(
    store: &dyn Store,
    thread_id: &str,
) -> Result<Option<Vec<Ingredient>>, StoreError> {
    load_fragment(store, INGREDIENTS_FRAGMENT, thread_id).await
}

pub async fn load_goals(store: &dyn Store, thread_id: &str) -> Result<Option<Goals>, StoreError> {
    load_fragment(store, GOALS_FRAGMENT, thread_id).await
}

pub async fn load_package(
    store: &dyn Store,
    thread_id: &str,
) -> Result<Option<ProductPackage>, StoreError> {
    load_fragment(store, PACKAGE_FRAGMENT, thread_id).await
}
