//! Task types and their timeout / temperature profiles.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of model call. Each maps to a distinct [`TaskProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Extraction,
    Clarification,
    QuestionGeneration,
    Categorization,
    GoalFormation,
    Creative,
    Analysis,
    Image,
    Default,
}

/// Per-call limits the gateway and the retry controller honor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskProfile {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Sampling temperature passed to the provider.
    pub temperature: f32,
}

impl TaskType {
    pub const ALL: [TaskType; 9] = [
        TaskType::Extraction,
        TaskType::Clarification,
        TaskType::QuestionGeneration,
        TaskType::Categorization,
        TaskType::GoalFormation,
        TaskType::Creative,
        TaskType::Analysis,
        TaskType::Image,
        TaskType::Default,
    ];

    /// Fast and deterministic for extraction/categorization, slower and more
    /// creative for goal formation and prompt building.
    pub fn profile(self) -> TaskProfile {
        let (secs, temperature) = match self {
            TaskType::Extraction => (20, 0.1),
            TaskType::Categorization => (20, 0.1),
            TaskType::Clarification => (30, 0.2),
            TaskType::QuestionGeneration => (30, 0.4),
            TaskType::Analysis => (45, 0.3),
            TaskType::GoalFormation => (60, 0.8),
            TaskType::Creative => (90, 0.9),
            TaskType::Image => (90, 0.7),
            TaskType::Default => (30, 0.5),
        };
        TaskProfile {
            timeout: Duration::from_secs(secs),
            temperature,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Extraction => "extraction",
            TaskType::Clarification => "clarification",
            TaskType::QuestionGeneration => "question_generation",
            TaskType::Categorization => "categorization",
            TaskType::GoalFormation => "goal_formation",
            TaskType::Creative => "creative",
            TaskType::Analysis => "analysis",
            TaskType::Image => "image",
            TaskType::Default => "default",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
