//! `sharing`: the final node. Builds the share card and completes the workflow.

use async_trait::async_trait;

use crate::workflow::executor::{ExecutorFault, NodeExecutor};
use crate::workflow::outputs::ShareCard;
use crate::workflow::state::{Phase, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::{build_package, slugify, SHARING};

const MAX_HASHTAGS: usize = 6;

fn hashtag(word: &str) -> Option<String> {
    let tag: String = word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    (!tag.is_empty()).then(|| format!("#{}", tag.to_lowercase()))
}

pub struct Sharing;

#[async_trait]
impl NodeExecutor for Sharing {
    fn id(&self) -> &'static str {
        SHARING
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let package = match &state.final_package {
            Some(p) => p.clone(),
            None => build_package(state),
        };
        let caption = format!(
            "I made a {} from {} reused item{}.",
            package.title.to_lowercase(),
            package.sustainability.items_reused,
            if package.sustainability.items_reused == 1 { "" } else { "s" }
        );
        let mut hashtags = vec!["#upcycling".to_string()];
        for tag in package
            .artifact_type
            .split_whitespace()
            .chain(package.sustainability.materials.iter().map(String::as_str))
            .filter_map(hashtag)
        {
            if !hashtags.contains(&tag) && hashtags.len() < MAX_HASHTAGS {
                hashtags.push(tag);
            }
        }
        Ok(StateUpdate {
            phase: Some(Phase::Complete),
            share: Some(ShareCard {
                slug: slugify(&package.title),
                caption,
                hashtags,
            }),
            ..StateUpdate::new()
        })
    }
}
