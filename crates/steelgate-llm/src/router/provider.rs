//! Provider adapter trait definition
//!
//! This module defines the contract every hosted-LLM adapter implements.

use super::types::ProviderName;
use crate::completion::{ChatOptions, ChunkStream, CompletionResult, EmbeddingResult};
use crate::cost::ModelRate;
use crate::error::{Error, Result};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static description of what an adapter can do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Streaming chat completions
    pub supports_streaming: bool,
    /// Function calling
    pub supports_tools: bool,
    /// Vector embeddings
    pub supports_embeddings: bool,
    /// Image input
    pub supports_vision: bool,
    /// Context window (tokens) per model
    pub context_windows: BTreeMap<String, u32>,
    /// Rate entry per model
    pub pricing: BTreeMap<String, ModelRate>,
}

impl ProviderCapabilities {
    /// Build the pricing map from a list of rates
    #[must_use]
    pub fn with_rates(mut self, rates: impl IntoIterator<Item = ModelRate>) -> Self {
        self.pricing = rates
            .into_iter()
            .map(|rate| (rate.model.clone(), rate))
            .collect();
        self
    }
}

/// Trait for hosted LLM adapters
///
/// Adapters are stateless apart from their HTTP client and configuration;
/// they translate the uniform request shape into the backend's native wire
/// format and decode the response once at this boundary.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier
    fn name(&self) -> ProviderName;

    /// Static capability description (no I/O)
    fn capabilities(&self) -> ProviderCapabilities;

    /// Non-streaming chat completion
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResult>;

    /// Streaming chat completion
    ///
    /// The returned stream ends with exactly one `Complete` chunk on success.
    async fn stream_chat_completion(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream>;

    /// Vector embeddings, one per input in input order
    async fn create_embeddings(&self, model: &str, input: &[String]) -> Result<EmbeddingResult> {
        let _ = (model, input);
        Err(Error::capability(self.name().as_str(), "embeddings"))
    }

    /// Cheap connectivity probe; never errors
    async fn test_connection(&self) -> bool;
}
