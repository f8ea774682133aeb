//! Node executors, one per pipeline step.
//!
//! | Node                | Phase               | Calls model          |
//! |---------------------|---------------------|----------------------|
//! | `extract`           | discovery           | extraction           |
//! | `null_check`        | discovery           | question_generation  |
//! | `ask_user`          | discovery           | clarification        |
//! | `categorize`        | discovery           | categorization       |
//! | `goal_formation`    | goal_formation      | goal_formation       |
//! | `choice_generation` | goal_formation      | creative             |
//! | `evaluation`        | goal_formation      | analysis             |
//! | `prompt_build`      | concept_generation  | creative             |
//! | `image_generate`    | concept_generation  | image                |
//! | `packaging`         | output_assembly     | no                   |
//! | `export`            | output_assembly     | no                   |
//! | `analytics`         | output_assembly     | no                   |
//! | `sharing`           | output_assembly     | no                   |

mod analytics;
mod ask_user;
mod categorize;
mod choice_generation;
mod evaluation;
mod export;
mod extract;
mod goal_formation;
mod image_generate;
mod null_check;
mod packaging;
mod prompt_build;
mod sharing;

pub use analytics::{summarize, Analytics};
pub use ask_user::AskUser;
pub use categorize::Categorize;
pub use choice_generation::ChoiceGeneration;
pub use evaluation::{apply_safety_veto, Evaluation};
pub use export::Export;
pub use extract::{fallback_ingredient, Extract, FALLBACK_CONFIDENCE};
pub use goal_formation::GoalFormation;
pub use image_generate::ImageGenerate;
pub use null_check::{template_question, NullCheck};
pub use packaging::{build_package, Packaging};
pub use prompt_build::{PromptBuild, VARIANT_STYLES};
pub use sharing::Sharing;

use crate::gateway::{ModelOutcome, TaskType};

use super::ingredient::Ingredient;
use super::state::WorkflowErrorRecord;

pub const EXTRACT: &str = "extract";
pub const NULL_CHECK: &str = "null_check";
pub const ASK_USER: &str = "ask_user";
pub const CATEGORIZE: &str = "categorize";
pub const GOAL_FORMATION: &str = "goal_formation";
pub const CHOICE_GENERATION: &str = "choice_generation";
pub const EVALUATION: &str = "evaluation";
pub const PROMPT_BUILD: &str = "prompt_build";
pub const IMAGE_GENERATE: &str = "image_generate";
pub const PACKAGING: &str = "packaging";
pub const EXPORT: &str = "export";
pub const ANALYTICS: &str = "analytics";
pub const SHARING: &str = "sharing";

/// Error record for a model call that fell back; `None` on success.
pub(crate) fn fallback_error<T>(
    node: &str,
    task: TaskType,
    outcome: &ModelOutcome<T>,
) -> Option<WorkflowErrorRecord> {
    outcome.failure_message().map(|message| {
        WorkflowErrorRecord::recoverable(
            "model_fallback",
            node,
            format!("{} call fell back: {}", task, message),
        )
    })
}

/// "3 plastic water bottles (plastic, 500 ml); twine" style listing for prompts.
pub(crate) fn describe_ingredients(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(|i| {
            let details: Vec<&str> = [i.material.as_deref(), i.size.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if details.is_empty() {
                i.label().to_string()
            } else {
                format!("{} ({})", i.label(), details.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Lowercase, ASCII alphanumerics, single dashes.
pub(crate) fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "craft".to_string()
    } else {
        slug
    }
}
