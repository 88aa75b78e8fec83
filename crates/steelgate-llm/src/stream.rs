//! Streaming support shared by the adapters
//!
//! - [`SseDecoder`]: incremental `text/event-stream` decoder fed with raw
//!   body bytes in arbitrary chunk boundaries
//! - [`StreamAccumulator`]: running aggregates, partial tool calls and
//!   usage; hands out the terminal [`StreamChunk::Complete`] exactly once
//! - [`sse_chunk_stream`]: drives a `reqwest::Response` body through both

use crate::completion::{ChunkStream, StreamChunk, TokenUsage};
use crate::error::{Error, Result};
use crate::tools::ToolCall;
use futures::StreamExt;
use std::collections::BTreeMap;
use tracing::trace;

/// One decoded server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, if present
    pub event: Option<String>,
    /// `data:` lines joined by `\n`
    pub data: String,
}

/// Incremental server-sent-events decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event not terminated by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            let line = line.trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

/// Running state of one streamed completion
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    reasoning: String,
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    cached_tokens: Option<u32>,
    reasoning_tokens: Option<u32>,
    finish_reason: Option<String>,
    tool_calls: BTreeMap<usize, PartialToolCall>,
    completed: bool,
}

/// Tool call assembled from argument fragments
#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl PartialToolCall {
    fn into_call(self) -> ToolCall {
        let arguments = if self.arguments.trim().is_empty() {
            "{}".to_string()
        } else {
            self.arguments
        };
        ToolCall {
            id: self.id,
            name: self.name,
            arguments,
        }
    }
}

impl StreamAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append visible content; empty deltas produce no chunk
    pub fn push_content(&mut self, delta: &str) -> Option<StreamChunk> {
        if delta.is_empty() || self.completed {
            return None;
        }
        self.content.push_str(delta);
        Some(StreamChunk::Content {
            delta: delta.to_string(),
            aggregate: self.content.clone(),
        })
    }

    /// Append reasoning text; empty deltas produce no chunk
    pub fn push_reasoning(&mut self, delta: &str) -> Option<StreamChunk> {
        if delta.is_empty() || self.completed {
            return None;
        }
        self.reasoning.push_str(delta);
        Some(StreamChunk::Reasoning {
            delta: delta.to_string(),
            aggregate: self.reasoning.clone(),
        })
    }

    /// Merge a tool-call fragment into the call at `index`
    ///
    /// Id and name arrive once, with the first fragment; arguments arrive as
    /// JSON text split at arbitrary points.
    pub fn push_tool_call_delta(
        &mut self,
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) {
        if self.completed {
            return;
        }
        let call = self.tool_calls.entry(index).or_default();
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            call.name = name.to_string();
        }
        if let Some(arguments) = arguments {
            call.arguments.push_str(arguments);
        }
    }

    /// Record the upstream finish reason
    pub fn set_finish_reason(&mut self, reason: impl Into<String>) {
        self.finish_reason = Some(reason.into());
    }

    /// Record prompt-side usage (Anthropic `message_start`)
    pub fn record_input(&mut self, input_tokens: u32, cached_tokens: Option<u32>) {
        self.input_tokens = Some(input_tokens);
        if cached_tokens.is_some() {
            self.cached_tokens = cached_tokens;
        }
    }

    /// Record completion-side usage (Anthropic `message_delta`)
    pub fn record_output(&mut self, output_tokens: u32) {
        self.output_tokens = Some(output_tokens);
    }

    /// Replace usage with a full upstream report
    pub fn set_usage(&mut self, usage: TokenUsage) {
        self.input_tokens = Some(usage.input_tokens);
        self.output_tokens = Some(usage.output_tokens);
        self.cached_tokens = usage.cached_tokens;
        self.reasoning_tokens = usage.reasoning_tokens;
    }

    /// Usage accumulated so far; missing counters are zero
    #[must_use]
    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(
            self.input_tokens.unwrap_or(0),
            self.output_tokens.unwrap_or(0),
        )
        .with_cached_tokens(self.cached_tokens)
        .with_reasoning_tokens(self.reasoning_tokens)
    }

    /// Content aggregated so far
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the terminal chunk has been handed out
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The assembled tool calls followed by the terminal chunk
    ///
    /// Tool calls come out in index order. Empty on every call after the
    /// first.
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        if self.completed {
            return Vec::new();
        }
        self.completed = true;

        let mut chunks: Vec<StreamChunk> = std::mem::take(&mut self.tool_calls)
            .into_values()
            .map(|call| StreamChunk::ToolCall {
                call: call.into_call(),
            })
            .collect();
        chunks.push(StreamChunk::Complete {
            usage: self.usage(),
            finish_reason: self.finish_reason.clone(),
        });
        chunks
    }
}

/// Turn an SSE response body into a [`ChunkStream`]
///
/// `handler` maps each event to zero or more chunks and calls
/// [`StreamAccumulator::finish`] when the upstream signals the end. If the
/// body ends first, the terminal chunk is synthesized from whatever usage was
/// accumulated. Events arriving after completion are ignored.
pub(crate) fn sse_chunk_stream<F>(
    response: reqwest::Response,
    timeout_ms: u64,
    mut handler: F,
) -> ChunkStream
where
    F: FnMut(&SseEvent, &mut StreamAccumulator) -> Result<Vec<StreamChunk>> + Send + 'static,
{
    let stream = async_stream::try_stream! {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut acc = StreamAccumulator::new();

        while let Some(bytes) = body.next().await {
            let bytes = bytes.map_err(|e| Error::from_transport(&e, timeout_ms))?;
            for event in decoder.push(&bytes) {
                if acc.is_complete() {
                    continue;
                }
                trace!(event = ?event.event, "sse event");
                for chunk in handler(&event, &mut acc)? {
                    yield chunk;
                }
            }
        }

        if let Some(event) = decoder.finish() {
            if !acc.is_complete() {
                for chunk in handler(&event, &mut acc)? {
                    yield chunk;
                }
            }
        }

        for chunk in acc.finish() {
            yield chunk;
        }
    };
    Box::pin(stream)
}
