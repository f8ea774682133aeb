//! Applying a user's answer to the pending clarification question.
//!
//! Three tiers, tried in order:
//! 1. AI-assisted update across all ingredients (schema-constrained);
//! 2. keyword inference on the asked ingredient;
//! 3. leave the ingredients unchanged.
//!
//! No tier ever drops a field that was already known.

use serde::Deserialize;
use serde_json::json;

use crate::gateway::{ModelOutcome, ModelRequest, TaskType};

use super::executor::ExecutorContext;
use super::ingredient::{Ingredient, IngredientField, IngredientSource};
use super::keywords;
use super::state::PendingQuestion;

/// Which tier produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClarificationTier {
    AiAssisted,
    Keyword,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationOutcome {
    pub ingredients: Vec<Ingredient>,
    pub tier: ClarificationTier,
}

/// Confidence given to an ingredient whose asked field was filled from an answer.
const CLARIFIED_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ProposedFields {
    name: Option<String>,
    size: Option<String>,
    material: Option<String>,
    condition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProposedIngredients {
    ingredients: Vec<ProposedFields>,
}

fn schema() -> serde_json::Value {
    let nullable = json!({"type": ["string", "null"]});
    json!({
        "type": "object",
        "required": ["ingredients"],
        "properties": {
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": nullable,
                        "size": nullable,
                        "material": nullable,
                        "condition": nullable
                    }
                }
            }
        }
    })
}

/// Fills `slot` from `value` only when the slot is missing and the value is not blank.
fn fill(slot: &mut Option<String>, value: Option<String>) -> bool {
    let missing = slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
    match value.map(|v| v.trim().to_string()) {
        Some(v) if missing && !v.is_empty() => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

/// Merges model-proposed fields into the known ingredients. Known values are
/// never overwritten; `None` when the ingredient count changed.
pub(crate) fn merge_known(
    current: &[Ingredient],
    proposed: Vec<ProposedFields>,
) -> Option<Vec<Ingredient>> {
    if proposed.len() != current.len() {
        return None;
    }
    let merged = current
        .iter()
        .cloned()
        .zip(proposed)
        .map(|(mut ing, p)| {
            let mut changed = fill(&mut ing.name, p.name);
            changed |= fill(&mut ing.material, p.material);
            changed |= fill(&mut ing.size, p.size);
            changed |= fill(&mut ing.condition, p.condition);
            if changed {
                ing.source = IngredientSource::Clarified;
                ing.refresh_clarification_flag();
            }
            ing
        })
        .collect();
    Some(merged)
}

fn mark_answered(ingredients: &mut [Ingredient], index: usize) {
    if let Some(ing) = ingredients.get_mut(index) {
        ing.source = IngredientSource::Clarified;
        let boosted = ing.confidence().max(CLARIFIED_CONFIDENCE);
        ing.set_confidence(boosted);
        ing.refresh_clarification_flag();
    }
}

async fn ai_update(
    ctx: &ExecutorContext,
    ingredients: &[Ingredient],
    question: &PendingQuestion,
    answer: &str,
) -> Option<Vec<Ingredient>> {
    let listing = serde_json::to_string(ingredients).ok()?;
    let prompt = format!(
        "Known ingredients (JSON): {}\nQuestion asked about ingredient #{} ({}): {}\nUser answer: {}\n\
         Return the full ingredient list with any fields the answer supplies. \
         Use null for anything still unknown. Keep the same number of ingredients in the same order.",
        listing,
        question.ingredient_index + 1,
        question.field,
        question.text,
        answer
    );
    let request = ModelRequest::new(TaskType::Clarification, prompt).with_schema(schema());
    let proposed = match ctx.call::<ProposedIngredients>(request).await {
        ModelOutcome::Success { data } => data.ingredients,
        other => {
            tracing::debug!(failure = ?other.failure_message(), "AI clarification unavailable");
            return None;
        }
    };
    let mut merged = merge_known(ingredients, proposed)?;
    let filled = merged
        .get(question.ingredient_index)
        .map(|i| i.has_field(question.field))
        .unwrap_or(false);
    if !filled {
        return None;
    }
    mark_answered(&mut merged, question.ingredient_index);
    Some(merged)
}

/// Tier 2: keyword dictionaries on the asked ingredient.
pub fn keyword_update(
    ingredients: &[Ingredient],
    question: &PendingQuestion,
    answer: &str,
) -> Option<Vec<Ingredient>> {
    let mut updated = ingredients.to_vec();
    let target = updated.get_mut(question.ingredient_index)?;
    let value = match question.field {
        IngredientField::Material => keywords::infer_material(answer),
        IngredientField::Size => keywords::infer_size(answer),
        IngredientField::Name => {
            let cleaned = keywords::clean_answer(answer);
            (!cleaned.is_empty()).then_some(cleaned)
        }
    };
    let value = value?;
    if target.has_field(question.field) {
        return None;
    }
    target.set_field(question.field, value);
    if target.condition.is_none() {
        target.condition = keywords::infer_condition(answer);
    }
    mark_answered(&mut updated, question.ingredient_index);
    Some(updated)
}

/// Applies `answer` to `question` through the three tiers.
pub async fn apply_clarification(
    ctx: &ExecutorContext,
    ingredients: &[Ingredient],
    question: &PendingQuestion,
    answer: &str,
) -> ClarificationOutcome {
    if keywords::is_non_answer(answer) {
        return ClarificationOutcome {
            ingredients: ingredients.to_vec(),
            tier: ClarificationTier::Unchanged,
        };
    }
    if let Some(updated) = ai_update(ctx, ingredients, question, answer).await {
        return ClarificationOutcome {
            ingredients: updated,
            tier: ClarificationTier::AiAssisted,
        };
    }
    if let Some(updated) = keyword_update(ingredients, question, answer) {
        return ClarificationOutcome {
            ingredients: updated,
            tier: ClarificationTier::Keyword,
        };
    }
    ClarificationOutcome {
        ingredients: ingredients.to_vec(),
        tier: ClarificationTier::Unchanged,
    }
}
