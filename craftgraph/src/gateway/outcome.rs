//! Tagged result of a model call after retries and parse repair.

use super::ErrorKind;

/// What a node gets back from [`call_with_retry`](super::call_with_retry).
///
/// Nodes match on this and pick their manual fallback for the two failure arms;
/// nothing past the node boundary ever sees a provider error.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome<T> {
    /// Output parsed into the declared shape.
    Success { data: T },
    /// The provider answered but the text never matched the shape; `raw` is the last reply.
    SchemaError { raw: String },
    /// Terminal or exhausted provider failure.
    ProviderError { kind: ErrorKind, message: String },
}

impl<T> ModelOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            ModelOutcome::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ModelOutcome::Success { .. })
    }

    /// One-line description of a failure, for error records. `None` on success.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            ModelOutcome::Success { .. } => None,
            ModelOutcome::SchemaError { raw } => {
                let preview: String = raw.chars().take(120).collect();
                Some(format!("unparseable model output: {}", preview))
            }
            ModelOutcome::ProviderError { kind, message } => {
                Some(format!("{}: {}", kind.as_str(), message))
            }
        }
    }
}
