use super::convert::{convert_messages, convert_tool, handle_stream_event, into_completion_result};
use super::types::{
    AnthropicConfig, AnthropicError, AnthropicRequest, AnthropicResponse, API_VERSION, MODELS,
};
use crate::completion::{ChatOptions, ChunkStream, CompletionResult};
use crate::cost::rates_for;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::router::{ProviderAdapter, ProviderCapabilities, ProviderName};
use crate::stream::sse_chunk_stream;
use crate::util::sanitize_api_error;
use reqwest::{Client, RequestBuilder};
use std::fmt;
use tracing::{debug, instrument};

/// Anthropic Claude provider
pub struct AnthropicProvider {
    pub(crate) client: Client,
    pub(crate) config: AnthropicConfig,
    timeout_ms: u64,
}

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        // Streams are bounded per read; whole-call deadlines go on the request
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        let timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX);

        Ok(Self {
            client,
            config,
            timeout_ms,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config = AnthropicConfig::from_env()?;
        Self::new(config)
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn build_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> AnthropicRequest {
        let (system, messages) = convert_messages(messages);
        let tools = (!options.tools.is_empty())
            .then(|| options.tools.iter().map(convert_tool).collect());

        AnthropicRequest {
            model: model.to_string(),
            max_tokens: options.max_tokens.unwrap_or(self.config.default_max_tokens),
            system,
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            stop_sequences: options.stop.clone(),
            tools,
            stream: stream.then_some(true),
        }
    }

    /// Send request to the Messages API; non-2xx statuses become classified errors
    ///
    /// Non-streaming requests are capped at the configured timeout end to end.
    async fn send_request(&self, request: &AnthropicRequest) -> Result<reqwest::Response> {
        let url = format!("{}/v1/messages", self.base_url());

        debug!("Sending request to Anthropic: {}", url);

        let mut builder = self.authorized(self.client.post(&url)).json(request);
        if request.stream.is_none() {
            builder = builder.timeout(self.config.timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_transport(&e, self.timeout_ms))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<AnthropicError>(&body) {
            Ok(error) => format!("{}: {}", error.error.r#type, error.error.message),
            Err(_) => format!("HTTP {status}: {body}"),
        };
        Err(Error::from_status(
            status.as_u16(),
            sanitize_api_error(&message),
        ))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Anthropic
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_streaming: true,
            supports_tools: true,
            supports_embeddings: false,
            supports_vision: true,
            context_windows: MODELS
                .iter()
                .map(|(model, window)| ((*model).to_string(), *window))
                .collect(),
            ..ProviderCapabilities::default()
        }
        .with_rates(rates_for(ProviderName::Anthropic))
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResult> {
        let request = self.build_request(model, messages, options, false);
        let response = self.send_request(&request).await?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::from_transport(&e, self.timeout_ms))?;
        let response: AnthropicResponse =
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(into_completion_result(model, response))
    }

    #[instrument(skip(self, messages, options), fields(messages = messages.len()))]
    async fn stream_chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream> {
        let request = self.build_request(model, messages, options, true);
        let response = self.send_request(&request).await?;
        Ok(sse_chunk_stream(
            response,
            self.timeout_ms,
            handle_stream_event,
        ))
    }

    async fn test_connection(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url());
        let request = self
            .authorized(self.client.get(&url))
            .timeout(self.config.timeout);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Anthropic connection probe failed");
                false
            }
        }
    }
}
