//! Completion service integration for question-to-SQL generation

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Completion request failed: {0}")]
    Api(#[from] OpenAIError),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion contained no text")]
    EmptyCompletion,
}

/// Turns an instruction block plus a question into raw model text.
///
/// One call per question: implementations make a single attempt and report
/// failure instead of returning placeholder text.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(&self, instructions: &str, question: &str) -> Result<String, GenerationError>;
}

/// Generator backed by an OpenAI-compatible chat completion endpoint
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(settings: &LlmConfig, api_key: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base);
        }

        // The client retries 5xx and 429 by default; one attempt only
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(config).with_backoff(no_retry),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.timeout(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl QueryGenerator for OpenAiGenerator {
    async fn generate(&self, instructions: &str, question: &str) -> Result<String, GenerationError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(instructions)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(question)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .temperature(self.temperature)
            .build()?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyCompletion)?;

        tracing::debug!(model = %self.model, response = %content, "Completion received");
        Ok(content)
    }
}
