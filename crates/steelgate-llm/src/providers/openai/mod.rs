//! OpenAI - GPT-4o family, o1 reasoning models and embeddings
//!
//! Talks to the Chat Completions and Embeddings APIs over the shared
//! OpenAI-compatible wire layer. Reasoning models (`o1*`, `o3*`) take
//! `max_completion_tokens` and reject sampling parameters.

use super::compat::{
    build_chat_request, handle_stream_event, into_completion_result, into_embedding_result,
    ChatResponse, CompatEndpoint, EmbeddingBody, EmbeddingResponse, TokenLimitStyle,
};
use crate::completion::{ChatOptions, ChunkStream, CompletionResult, EmbeddingResult};
use crate::cost::rates_for;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::router::{ProviderAdapter, ProviderCapabilities, ProviderName, ProviderSettings};
use crate::stream::sse_chunk_stream;
use crate::util::mask_api_key;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat models and their context windows (tokens)
pub const MODELS: &[(&str, u32)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("o1", 200_000),
    ("o1-mini", 128_000),
];

/// Whether a model belongs to the o-series reasoning family
#[must_use]
pub fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3")
}

/// Configuration for the OpenAI adapter
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL (proxies, Azure-style gateways)
    pub base_url: String,
    /// Request timeout duration
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates configuration from `OPENAI_API_KEY` and `OPENAI_BASE_URL`
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the key is not set
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::Config(format!("{API_KEY_ENV} not set")))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_API_BASE.to_string());

        Ok(Self::new(api_key).with_base_url(base_url))
    }

    /// Creates configuration from gateway settings
    #[must_use]
    pub fn from_settings(api_key: impl Into<String>, settings: &ProviderSettings) -> Self {
        let mut config = Self::new(api_key);
        if let Some(base_url) = &settings.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout_ms) = settings.timeout_ms {
            config.timeout = Duration::from_millis(timeout_ms);
        }
        config
    }

    /// Sets a custom base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI adapter
pub struct OpenAiProvider {
    endpoint: CompatEndpoint,
    config: OpenAiConfig,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a new OpenAI adapter
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let endpoint = CompatEndpoint::new(
            ProviderName::OpenAi,
            &config.base_url,
            &config.api_key,
            config.timeout,
        )?;
        Ok(Self { endpoint, config })
    }

    /// Creates an adapter from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    fn limit_style(model: &str) -> TokenLimitStyle {
        if is_reasoning_model(model) {
            TokenLimitStyle::Reasoning
        } else {
            TokenLimitStyle::Standard
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenAi
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_streaming: true,
            supports_tools: true,
            supports_embeddings: true,
            supports_vision: true,
            context_windows: MODELS
                .iter()
                .map(|(model, window)| ((*model).to_string(), *window))
                .collect(),
            ..ProviderCapabilities::default()
        }
        .with_rates(rates_for(ProviderName::OpenAi))
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResult> {
        let request =
            build_chat_request(model, messages, options, Self::limit_style(model), false);

        debug!("Sending request to OpenAI");
        let response: ChatResponse = self
            .endpoint
            .post_json("/chat/completions", &request)
            .await?;

        into_completion_result(ProviderName::OpenAi, model, response)
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn stream_chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream> {
        let request = build_chat_request(model, messages, options, Self::limit_style(model), true);

        debug!("Opening OpenAI stream");
        let response = self.endpoint.post_stream("/chat/completions", &request).await?;
        Ok(sse_chunk_stream(
            response,
            self.endpoint.timeout_ms(),
            handle_stream_event,
        ))
    }

    #[instrument(skip(self, input), fields(inputs = input.len()))]
    async fn create_embeddings(&self, model: &str, input: &[String]) -> Result<EmbeddingResult> {
        let body = EmbeddingBody { model, input };
        let response: EmbeddingResponse = self.endpoint.post_json("/embeddings", &body).await?;
        into_embedding_result(ProviderName::OpenAi, model, input.len(), response)
    }

    async fn test_connection(&self) -> bool {
        self.endpoint.probe().await
    }
}

#[cfg(test)]
mod tests;
