//! Steelgate LLM - multi-provider AI gateway
//!
//! This crate provides one entry point for chat completions, streamed
//! completions and embeddings across upstream model providers:
//! - Router: task/quality based provider and model selection
//! - Gateway: retry with exponential backoff, single-level failover
//! - OpenAI: GPT-4o family, o1 reasoning models, text-embedding-3
//! - DeepSeek: Ultra-low-cost chat and R1 reasoner
//! - Anthropic: Claude 3.5 family
//! - Cost: per `provider:model` usage and cost ledger

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod cost;
pub mod error;
pub mod message;
pub mod providers;
pub mod router;
pub mod stream;
pub mod tools;
pub mod util;

pub use completion::{
    ChatOptions, ChunkStream, CompletionRequest, CompletionResult, EmbeddingRequest,
    EmbeddingResult, StreamChunk, TokenUsage,
};
pub use cost::{default_rates, usage_key, ModelRate, UsageLedger, UsageRecord, UsageSnapshot};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use router::{
    AiGateway, GatewayConfig, MockProvider, ProviderAdapter, ProviderCapabilities,
    ProviderChoice, ProviderName, ProviderSettings, ProvidersConfig, QualityTier,
    Recommendation, RecommendationReason, RetryPolicy, RetrySettings, SelectionPolicy, TaskType,
};
pub use tools::{ToolCall, ToolDefinition};

// Re-export provider types
pub use providers::{
    AnthropicConfig, AnthropicProvider, DeepSeekConfig, DeepSeekProvider, OpenAiConfig,
    OpenAiProvider,
};
