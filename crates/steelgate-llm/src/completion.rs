//! Completion request and response types
//!
//! Provider-specific payloads (OpenAI tool calls, DeepSeek reasoning content,
//! Anthropic content blocks, cache-hit counters) are decoded once at the
//! adapter boundary into these types.

use crate::error::Result;
use crate::message::Message;
use crate::router::{ProviderChoice, ProviderName, QualityTier, TaskType};
use crate::tools::{ToolCall, ToolDefinition};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Token usage information
///
/// `total_tokens == input_tokens + output_tokens` whenever both are known.
/// `cached_tokens` and `reasoning_tokens` are optional provider extras.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u32,
    /// Completion tokens
    pub output_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
    /// Prompt tokens served from the provider's cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
    /// Completion tokens spent on hidden reasoning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

impl TokenUsage {
    /// Create usage from input and output counts
    #[must_use]
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            cached_tokens: None,
            reasoning_tokens: None,
        }
    }

    /// Attach a cache-hit count
    #[must_use]
    pub fn with_cached_tokens(mut self, cached: Option<u32>) -> Self {
        self.cached_tokens = cached;
        self
    }

    /// Attach a reasoning-token count
    #[must_use]
    pub fn with_reasoning_tokens(mut self, reasoning: Option<u32>) -> Self {
        self.reasoning_tokens = reasoning;
        self
    }
}

/// Sampling and generation options shared by all providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Presence penalty (OpenAI-compatible providers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty (OpenAI-compatible providers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Concrete provider or `auto`
    #[serde(default)]
    pub provider: ProviderChoice,
    /// Task used for provider and model selection
    #[serde(default)]
    pub task: TaskType,
    /// Quality tier used for model selection
    #[serde(default)]
    pub quality: QualityTier,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Model override (provider-specific)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Generation options
    #[serde(default)]
    pub options: ChatOptions,
}

impl CompletionRequest {
    /// Create an auto-routed request for a task
    #[must_use]
    pub fn new(task: TaskType) -> Self {
        Self {
            provider: ProviderChoice::Auto,
            task,
            quality: QualityTier::default(),
            messages: Vec::new(),
            model: None,
            options: ChatOptions::default(),
        }
    }

    /// Pin a provider
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderChoice) -> Self {
        self.provider = provider;
        self
    }

    /// Set the quality tier
    #[must_use]
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add messages
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    /// Offer a tool to the model
    #[must_use]
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.options.tools.push(tool);
        self
    }
}

/// Normalized completion result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Provider that served the call
    pub provider: ProviderName,
    /// Model the call was routed to
    pub model: String,
    /// Generated content
    pub content: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Finish reason as reported upstream
    pub finish_reason: Option<String>,
    /// Reasoning trace (DeepSeek reasoner, Anthropic thinking)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResult {
    /// Check if the response has tool calls
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One item of a streamed completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Visible content
    Content {
        /// Newly generated text
        delta: String,
        /// All content generated so far
        aggregate: String,
    },
    /// Reasoning trace
    Reasoning {
        /// Newly generated reasoning text
        delta: String,
        /// All reasoning generated so far
        aggregate: String,
    },
    /// A fully assembled tool call, emitted just before `Complete`
    ToolCall {
        /// The call with its complete JSON arguments
        call: ToolCall,
    },
    /// Terminal chunk, emitted exactly once
    Complete {
        /// Cumulative usage for the whole stream
        usage: TokenUsage,
        /// Finish reason as reported upstream
        finish_reason: Option<String>,
    },
}

impl StreamChunk {
    /// Whether this is the terminal chunk
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Lazy, finite, non-restartable stream of chunks
///
/// Dropping the stream releases the underlying connection.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Concrete provider or `auto`
    #[serde(default)]
    pub provider: ProviderChoice,
    /// Texts to embed
    pub input: Vec<String>,
    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create an auto-routed embedding request
    #[must_use]
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: ProviderChoice::Auto,
            input: input.into_iter().map(Into::into).collect(),
            model: None,
        }
    }

    /// Pin a provider
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderChoice) -> Self {
        self.provider = provider;
        self
    }
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    /// Provider that served the call
    pub provider: ProviderName,
    /// Embedding model
    pub model: String,
    /// One vector per input, in input order
    pub embeddings: Vec<Vec<f32>>,
    /// Token usage
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.cached_tokens, None);

        let usage = usage.with_cached_tokens(Some(100));
        assert_eq!(usage.cached_tokens, Some(100));
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(TaskType::Analysis)
            .with_provider(ProviderChoice::Named(ProviderName::Anthropic))
            .with_quality(QualityTier::Advanced)
            .with_message(Message::system("You analyse mill reports"))
            .with_message(Message::user("Summarize scrap rates"))
            .with_max_tokens(500)
            .with_temperature(0.2);

        assert_eq!(request.task, TaskType::Analysis);
        assert_eq!(request.quality, QualityTier::Advanced);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.options.max_tokens, Some(500));
        assert_eq!(request.options.temperature, Some(0.2));
        assert!(request.model.is_none());
    }

    #[test]
    fn test_completion_request_deserialize_defaults() {
        let request: CompletionRequest = serde_json::from_str(
            r#"{"provider":"auto","task":"chat","messages":[{"role":"user","content":"Say OK"}]}"#,
        )
        .unwrap();
        assert_eq!(request.provider, ProviderChoice::Auto);
        assert_eq!(request.task, TaskType::Chat);
        assert_eq!(request.quality, QualityTier::Balanced);
        assert_eq!(request.options, ChatOptions::default());
    }

    #[test]
    fn test_stream_chunk_serialization() {
        let chunk = StreamChunk::Content {
            delta: "lo".into(),
            aggregate: "Hello".into(),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["type"], "content");
        assert_eq!(json["aggregate"], "Hello");
        assert!(!chunk.is_complete());

        let done = StreamChunk::Complete {
            usage: TokenUsage::new(1, 2),
            finish_reason: Some("stop".into()),
        };
        assert!(done.is_complete());
    }
}
