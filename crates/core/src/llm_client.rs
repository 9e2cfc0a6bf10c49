use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// The distinct ways a completion request can fail.
///
/// A response that carries text, even empty text, is not a failure; callers
/// decide for themselves what an empty answer means.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] OpenAIError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("completion response contained no choices")]
    NoChoices,
    #[error("completion response choice had no text content")]
    NoContent,
}

/// A client that turns a prompt into answer text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` as a single user message and returns the trimmed answer.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// An implementation of `CompletionClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the service.
    /// * `model` - The model identifier to use for chat completions (e.g., "gemma-3-27b-it").
    /// * `timeout` - Upper bound on a single HTTP request to the service.
    pub fn new(
        config: OpenAIConfig,
        model: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            model,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        debug!(model = %self.model, choices = response.choices.len(), "Completion received");
        answer_text(response)
    }
}

fn answer_text(response: CreateChatCompletionResponse) -> Result<String, CompletionError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::NoChoices)?;
    let content = choice.message.content.ok_or(CompletionError::NoContent)?;
    Ok(content.trim().to_string())
}
