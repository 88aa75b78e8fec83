//! Mock provider adapter for testing
//!
//! Replies are scripted per call; every invocation is recorded together with
//! the (virtual) instant it happened, so retry delays can be asserted under a
//! paused Tokio clock.

use super::provider::{ProviderAdapter, ProviderCapabilities};
use super::types::ProviderName;
use crate::completion::{
    ChatOptions, ChunkStream, CompletionResult, EmbeddingResult, StreamChunk, TokenUsage,
};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::stream::StreamAccumulator;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Operation a [`MockProvider`] was asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    /// `chat_completion`
    Chat,
    /// `stream_chat_completion`
    Stream,
    /// `create_embeddings`
    Embeddings,
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Operation invoked
    pub operation: MockOperation,
    /// Model passed by the gateway
    pub model: String,
    /// Tokio instant of the call
    pub at: Instant,
}

/// Scripted chat reply
#[derive(Debug, Clone)]
pub struct MockReply {
    /// Content to return
    pub content: String,
    /// Usage to report
    pub usage: TokenUsage,
}

/// Embedding vector length produced by the mock
pub const MOCK_EMBEDDING_DIMENSIONS: usize = 4;

/// A mock adapter that returns queued replies or a default one
pub struct MockProvider {
    name: ProviderName,
    capabilities: ProviderCapabilities,
    replies: Arc<Mutex<VecDeque<Result<MockReply>>>>,
    sticky_error: Option<Error>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    reachable: bool,
}

impl MockProvider {
    /// Create a mock answering as `name`
    #[must_use]
    pub fn new(name: ProviderName) -> Self {
        Self {
            name,
            capabilities: ProviderCapabilities {
                supports_streaming: true,
                supports_tools: true,
                ..ProviderCapabilities::default()
            },
            replies: Arc::new(Mutex::new(VecDeque::new())),
            sticky_error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            reachable: true,
        }
    }

    /// Advertise embedding support
    #[must_use]
    pub fn with_embeddings(mut self) -> Self {
        self.capabilities.supports_embeddings = true;
        self
    }

    /// Fail every call with `error`
    #[must_use]
    pub fn failing(mut self, error: Error) -> Self {
        self.sticky_error = Some(error);
        self
    }

    /// Report `test_connection` as failing
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Queue a successful reply
    pub fn push_reply(&self, content: impl Into<String>, usage: TokenUsage) {
        self.lock_replies().push_back(Ok(MockReply {
            content: content.into(),
            usage,
        }));
    }

    /// Queue a failure
    pub fn push_error(&self, error: Error) {
        self.lock_replies().push_back(Err(error));
    }

    /// Recorded invocations, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of recorded invocations
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<MockReply>>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, operation: MockOperation, model: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                operation,
                model: model.to_string(),
                at: Instant::now(),
            });
    }

    fn next_reply(&self) -> Result<MockReply> {
        if let Some(error) = &self.sticky_error {
            return Err(error.clone());
        }
        self.lock_replies().pop_front().unwrap_or_else(|| {
            Ok(MockReply {
                content: "mock response".to_string(),
                usage: TokenUsage::new(10, 5),
            })
        })
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MockProvider {
    fn name(&self) -> ProviderName {
        self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities.clone()
    }

    async fn chat_completion(
        &self,
        model: &str,
        _messages: &[Message],
        _options: &ChatOptions,
    ) -> Result<CompletionResult> {
        self.record(MockOperation::Chat, model);
        let reply = self.next_reply()?;
        Ok(CompletionResult {
            provider: self.name,
            model: model.to_string(),
            content: reply.content,
            usage: reply.usage,
            finish_reason: Some("stop".to_string()),
            reasoning: None,
            tool_calls: Vec::new(),
        })
    }

    /// Streams the reply word by word, then the terminal chunk
    async fn stream_chat_completion(
        &self,
        model: &str,
        _messages: &[Message],
        _options: &ChatOptions,
    ) -> Result<ChunkStream> {
        self.record(MockOperation::Stream, model);
        let reply = self.next_reply()?;

        let mut acc = StreamAccumulator::new();
        let mut chunks: Vec<Result<StreamChunk>> = reply
            .content
            .split_inclusive(' ')
            .filter_map(|word| acc.push_content(word))
            .map(Ok)
            .collect();
        acc.set_usage(reply.usage);
        acc.set_finish_reason("stop");
        chunks.extend(acc.finish().into_iter().map(Ok));

        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn create_embeddings(&self, model: &str, input: &[String]) -> Result<EmbeddingResult> {
        if !self.capabilities.supports_embeddings {
            return Err(Error::capability(self.name.as_str(), "embeddings"));
        }
        self.record(MockOperation::Embeddings, model);
        let reply = self.next_reply()?;
        let embeddings = input
            .iter()
            .map(|text| {
                let seed = text.len() as f32;
                (0..MOCK_EMBEDDING_DIMENSIONS)
                    .map(|i| seed + i as f32)
                    .collect()
            })
            .collect();
        Ok(EmbeddingResult {
            provider: self.name,
            model: model.to_string(),
            embeddings,
            usage: TokenUsage::new(reply.usage.input_tokens, 0),
        })
    }

    async fn test_connection(&self) -> bool {
        self.reachable
    }
}
