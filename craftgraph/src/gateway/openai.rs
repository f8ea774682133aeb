//! OpenAI-compatible Chat Completions gateway (feature `openai`).
//!
//! Uses `OPENAI_API_KEY` from the environment by default, or explicit config
//! via [`OpenAiGateway::with_config`] (custom key or base URL). The task type
//! picks the temperature; a response schema, when present, is appended to the
//! system message so the model answers with JSON only. Image generation is not
//! wired and stays `Unavailable`.

use async_trait::async_trait;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::{GatewayError, ModelGateway, ModelRequest};

const SYSTEM_PROMPT: &str =
    "You help people turn leftover household materials into handmade products.";

/// Chat Completions client implementing [`ModelGateway`].
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGateway {
    /// Default config (API key from `OPENAI_API_KEY`).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
        }
    }

    /// Custom config (e.g. API key or base URL from `.env`).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    fn system_message(request: &ModelRequest) -> String {
        match &request.response_schema {
            Some(schema) => format!(
                "{}\nRespond with a single JSON value matching this JSON Schema and nothing else:\n{}",
                SYSTEM_PROMPT, schema
            ),
            None => SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Maps provider error text onto the gateway taxonomy.
fn classify(message: String) -> GatewayError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient_quota") || lower.contains("quota") || lower.contains("billing") {
        GatewayError::QuotaExceeded(message)
    } else if lower.contains("content_policy")
        || lower.contains("content_filter")
        || lower.contains("safety")
    {
        GatewayError::SafetyBlocked(message)
    } else if lower.contains("invalid_api_key")
        || lower.contains("model_not_found")
        || lower.contains("does not exist")
    {
        GatewayError::Unavailable(message)
    } else {
        GatewayError::Transient(message)
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                Self::system_message(request).as_str(),
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                request.prompt.as_str(),
            )),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages);
        args.temperature(request.task_type.profile().temperature);

        let built = args
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("request build failed: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(built)
            .await
            .map_err(|e| classify(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::MalformedOutput("no choices returned".to_string()))?;

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GatewayError::MalformedOutput("empty completion".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ErrorKind, TaskType};

    /// **Scenario**: Provider messages are classified into the gateway taxonomy.
    #[test]
    fn classify_provider_messages() {
        assert_eq!(
            classify("You exceeded your current quota (insufficient_quota)".into()).kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            classify("rejected by content_policy".into()).kind(),
            ErrorKind::SafetyBlocked
        );
        assert_eq!(
            classify("The model `x` does not exist".into()).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(classify("502 bad gateway".into()).kind(), ErrorKind::Transient);
    }

    /// **Scenario**: A response schema is appended to the system message.
    #[test]
    fn schema_goes_into_system_message() {
        let req = ModelRequest::new(TaskType::Extraction, "jar")
            .with_schema(serde_json::json!({"type": "object"}));
        let sys = OpenAiGateway::system_message(&req);
        assert!(sys.contains("JSON Schema"));
        assert!(sys.contains("\"object\""));
        let plain = OpenAiGateway::system_message(&ModelRequest::new(TaskType::Default, "x"));
        assert_eq!(plain, SYSTEM_PROMPT);
    }

    /// **Scenario**: with_config builds a client without panicking.
    #[test]
    fn with_config_creates_gateway() {
        let config = OpenAIConfig::new().with_api_key("test-key");
        let _ = OpenAiGateway::with_config(config, "gpt-4o-mini");
    }
}
