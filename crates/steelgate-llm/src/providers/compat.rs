//! OpenAI-compatible wire layer
//!
//! Shared by the OpenAI and DeepSeek adapters: request/response types,
//! the authenticated HTTP endpoint, usage mapping and the stream event
//! handler. Provider-specific extras (`reasoning_content`,
//! `prompt_cache_hit_tokens`) are optional fields decoded here once.

use crate::completion::{ChatOptions, CompletionResult, EmbeddingResult, StreamChunk, TokenUsage};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::router::ProviderName;
use crate::stream::{SseEvent, StreamAccumulator};
use crate::tools::{ToolCall, ToolDefinition};
use crate::util::sanitize_api_error;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Endpoint
// ============================================================================

/// Authenticated OpenAI-compatible endpoint
///
/// The client carries a connect timeout and an idle read timeout. Only
/// non-streaming requests get the whole-call deadline; a stream may run as
/// long as chunks keep arriving.
pub(crate) struct CompatEndpoint {
    client: Client,
    provider: ProviderName,
    base_url: String,
    api_key: String,
    timeout: Duration,
    timeout_ms: u64,
}

impl CompatEndpoint {
    pub(crate) fn new(
        provider: ProviderName,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn request<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(provider = %self.provider, %url, "sending request");
        self.client.post(url).bearer_auth(&self.api_key).json(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::from_transport(&e, self.timeout_ms))?;
        self.check_status(response).await
    }

    /// Open a streaming response; bounded by the idle read timeout only
    pub(crate) async fn post_stream<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        self.send(self.request(path, body)).await
    }

    /// Whole-call request decoded as JSON
    pub(crate) async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .send(self.request(path, body).timeout(self.timeout))
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| Error::from_transport(&e, self.timeout_ms))?;
        serde_json::from_str(&text).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    pub(crate) async fn probe(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let request = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(provider = %self.provider, error = %e, "connection probe failed");
                false
            }
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        Err(Error::from_status(status.as_u16(), sanitize_api_error(&message)))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ============================================================================
// Chat request
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    /// Omitted on assistant turns that carry only tool calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<OutboundToolCall>,
}

/// Assistant tool call replayed in a request
#[derive(Debug, Serialize)]
pub(crate) struct OutboundToolCall {
    id: String,
    r#type: &'static str,
    function: OutboundFunction,
}

#[derive(Debug, Serialize)]
struct OutboundFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    r#type: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct StreamOptions {
    pub include_usage: bool,
}

fn convert_message(msg: &Message) -> WireMessage {
    let tool_calls: Vec<OutboundToolCall> = msg
        .tool_calls
        .iter()
        .map(|call| OutboundToolCall {
            id: call.id.clone(),
            r#type: "function",
            function: OutboundFunction {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        })
        .collect();
    let content = (!msg.content.is_empty() || tool_calls.is_empty()).then(|| msg.content.clone());

    WireMessage {
        role: msg.role.as_str().to_string(),
        content,
        tool_call_id: msg.tool_call_id.clone(),
        name: msg.name.clone(),
        tool_calls,
    }
}

fn convert_tool(tool: &ToolDefinition) -> WireTool {
    WireTool {
        r#type: "function",
        function: WireFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

/// How a backend expects the token limit and sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenLimitStyle {
    /// `max_tokens`, sampling parameters allowed
    Standard,
    /// `max_completion_tokens`, no temperature (OpenAI o-series)
    Reasoning,
}

pub(crate) fn build_chat_request(
    model: &str,
    messages: &[Message],
    options: &ChatOptions,
    style: TokenLimitStyle,
    stream: bool,
) -> ChatRequest {
    let reasoning = style == TokenLimitStyle::Reasoning;
    let tools = (!options.tools.is_empty())
        .then(|| options.tools.iter().map(convert_tool).collect());

    ChatRequest {
        model: model.to_string(),
        messages: messages.iter().map(convert_message).collect(),
        max_tokens: if reasoning { None } else { options.max_tokens },
        max_completion_tokens: if reasoning { options.max_tokens } else { None },
        temperature: if reasoning { None } else { options.temperature },
        top_p: if reasoning { None } else { options.top_p },
        stop: options.stop.clone(),
        presence_penalty: options.presence_penalty,
        frequency_penalty: options.frequency_penalty,
        tools,
        stream: stream.then_some(true),
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

// ============================================================================
// Chat response
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireToolCall {
    pub id: String,
    pub function: WireToolCallFunction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireToolCallFunction {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    pub prompt_tokens_details: Option<PromptTokensDetails>,
    pub completion_tokens_details: Option<CompletionTokensDetails>,
    /// DeepSeek context-cache hits
    pub prompt_cache_hit_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PromptTokensDetails {
    pub cached_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompletionTokensDetails {
    pub reasoning_tokens: Option<u32>,
}

impl WireUsage {
    pub(crate) fn to_usage(&self) -> TokenUsage {
        let cached = self.prompt_cache_hit_tokens.or_else(|| {
            self.prompt_tokens_details
                .as_ref()
                .and_then(|d| d.cached_tokens)
        });
        let reasoning = self
            .completion_tokens_details
            .as_ref()
            .and_then(|d| d.reasoning_tokens);

        TokenUsage::new(self.prompt_tokens, self.completion_tokens)
            .with_cached_tokens(cached)
            .with_reasoning_tokens(reasoning)
    }
}

pub(crate) fn into_completion_result(
    provider: ProviderName,
    model: &str,
    response: ChatResponse,
) -> Result<CompletionResult> {
    let usage = response
        .usage
        .as_ref()
        .map(WireUsage::to_usage)
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    Ok(CompletionResult {
        provider,
        model: model.to_string(),
        content: choice.message.content.unwrap_or_default(),
        usage,
        finish_reason: choice.finish_reason,
        reasoning: choice
            .message
            .reasoning_content
            .filter(|text| !text.is_empty()),
        tool_calls,
    })
}

// ============================================================================
// Streaming
// ============================================================================

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<WireUsage>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDelta>,
}

/// Fragment of a streamed tool call; `index` ties fragments together
#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<FunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Map one OpenAI-style stream event to chunks
///
/// `[DONE]` completes the stream; the usage-only event sent before it (with
/// `stream_options.include_usage`) has an empty `choices` array. Tool-call
/// fragments are held until then and come out whole.
pub(crate) fn handle_stream_event(
    event: &SseEvent,
    acc: &mut StreamAccumulator,
) -> Result<Vec<StreamChunk>> {
    let data = event.data.trim();
    if data == "[DONE]" {
        return Ok(acc.finish());
    }
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: StreamResponse =
        serde_json::from_str(data).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(Error::Upstream {
            status: None,
            message: error.message,
        });
    }

    let mut chunks = Vec::new();
    for choice in parsed.choices {
        if let Some(reasoning) = choice.delta.reasoning_content.as_deref() {
            chunks.extend(acc.push_reasoning(reasoning));
        }
        if let Some(content) = choice.delta.content.as_deref() {
            chunks.extend(acc.push_content(content));
        }
        for delta in choice.delta.tool_calls {
            let function = delta.function.unwrap_or_default();
            acc.push_tool_call_delta(
                delta.index,
                delta.id.as_deref(),
                function.name.as_deref(),
                function.arguments.as_deref(),
            );
        }
        if let Some(reason) = choice.finish_reason {
            acc.set_finish_reason(reason);
        }
    }
    if let Some(usage) = parsed.usage {
        acc.set_usage(usage.to_usage());
    }
    Ok(chunks)
}

// ============================================================================
// Embeddings
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingBody<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: usize,
}

pub(crate) fn into_embedding_result(
    provider: ProviderName,
    model: &str,
    expected: usize,
    response: EmbeddingResponse,
) -> Result<EmbeddingResult> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(Error::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);

    let input_tokens = response.usage.map(|u| u.prompt_tokens).unwrap_or(0);
    Ok(EmbeddingResult {
        provider,
        model: model.to_string(),
        embeddings: data.into_iter().map(|d| d.embedding).collect(),
        usage: TokenUsage::new(input_tokens, 0),
    })
}
