//! DeepSeek - Ultra-low-cost LLM provider
//!
//! DeepSeek provides extremely affordable models:
//! - deepseek-chat (V3): $0.14/1M input, $0.28/1M output
//! - deepseek-coder: specialized for code generation
//! - deepseek-reasoner (R1): exposes its reasoning trace as `reasoning_content`
//!
//! Uses the OpenAI-compatible API. DeepSeek has no embeddings endpoint.

use super::compat::{
    build_chat_request, handle_stream_event, into_completion_result, ChatResponse,
    CompatEndpoint, TokenLimitStyle,
};
use crate::completion::{ChatOptions, ChunkStream, CompletionResult};
use crate::cost::rates_for;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::router::{ProviderAdapter, ProviderCapabilities, ProviderName, ProviderSettings};
use crate::stream::sse_chunk_stream;
use crate::util::mask_api_key;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// DeepSeek API base URL
pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Default request timeout (DeepSeek can be slower)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Available DeepSeek models and their context windows (tokens)
pub const MODELS: &[(&str, u32)] = &[
    ("deepseek-chat", 64_000),
    ("deepseek-coder", 64_000),
    ("deepseek-reasoner", 64_000),
];

/// DeepSeek provider configuration
#[derive(Clone)]
pub struct DeepSeekConfig {
    /// API key
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeepSeekConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEEPSEEK_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::Config(format!("{API_KEY_ENV} not set")))?;
        Ok(Self::new(api_key))
    }

    /// Create configuration from gateway settings
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

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// DeepSeek provider (OpenAI-compatible)
pub struct DeepSeekProvider {
    endpoint: CompatEndpoint,
    config: DeepSeekConfig,
}

impl fmt::Debug for DeepSeekProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DeepSeekProvider {
    /// Create a new DeepSeek provider
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: DeepSeekConfig) -> Result<Self> {
        let endpoint = CompatEndpoint::new(
            ProviderName::DeepSeek,
            &config.base_url,
            &config.api_key,
            config.timeout,
        )?;
        Ok(Self { endpoint, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(DeepSeekConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for DeepSeekProvider {
    fn name(&self) -> ProviderName {
        ProviderName::DeepSeek
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_streaming: true,
            supports_tools: true,
            supports_embeddings: false,
            supports_vision: false,
            context_windows: MODELS
                .iter()
                .map(|(model, window)| ((*model).to_string(), *window))
                .collect(),
            ..ProviderCapabilities::default()
        }
        .with_rates(rates_for(ProviderName::DeepSeek))
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResult> {
        let request =
            build_chat_request(model, messages, options, TokenLimitStyle::Standard, false);

        debug!("Sending request to DeepSeek");
        let response: ChatResponse = self
            .endpoint
            .post_json("/chat/completions", &request)
            .await?;

        into_completion_result(ProviderName::DeepSeek, model, response)
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn stream_chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream> {
        let request = build_chat_request(model, messages, options, TokenLimitStyle::Standard, true);

        debug!("Opening DeepSeek stream");
        let response = self.endpoint.post_stream("/chat/completions", &request).await?;
        Ok(sse_chunk_stream(
            response,
            self.endpoint.timeout_ms(),
            handle_stream_event,
        ))
    }

    async fn test_connection(&self) -> bool {
        self.endpoint.probe().await
    }
}

#[cfg(test)]
mod tests;
