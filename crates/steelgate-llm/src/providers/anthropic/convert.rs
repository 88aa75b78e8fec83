use super::types::{
    AnthropicContent, AnthropicMessage, AnthropicResponse, AnthropicTool, BlockDelta,
    ContentBlock, ResponseContentBlock, StartBlock, StreamEvent,
};
use crate::completion::{CompletionResult, StreamChunk, TokenUsage};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::router::ProviderName;
use crate::stream::{SseEvent, StreamAccumulator};
use crate::tools::{ToolCall, ToolDefinition};

/// Convert messages to Anthropic format, returning the system prompt separately
///
/// Every system message is hoisted into the one `system` field, joined by
/// blank lines. Assistant tool calls become `tool_use` blocks and tool
/// results become user turns.
pub(crate) fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts = Vec::new();
    let mut anthropic_messages = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => {
                if !msg.content.is_empty() {
                    system_parts.push(msg.content.as_str());
                }
            }
            MessageRole::User => anthropic_messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: AnthropicContent::Text(msg.content.clone()),
            }),
            MessageRole::Assistant if msg.has_tool_calls() => {
                anthropic_messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: AnthropicContent::Blocks(assistant_blocks(msg)),
                });
            }
            MessageRole::Assistant => anthropic_messages.push(AnthropicMessage {
                role: "assistant".to_string(),
                content: AnthropicContent::Text(msg.content.clone()),
            }),
            MessageRole::Tool => {
                let content = match &msg.tool_call_id {
                    Some(tool_call_id) => AnthropicContent::Blocks(vec![ContentBlock::ToolResult {
                        tool_use_id: tool_call_id.clone(),
                        content: msg.content.clone(),
                    }]),
                    None => AnthropicContent::Text(format!("Tool result: {}", msg.content)),
                };
                anthropic_messages.push(AnthropicMessage {
                    role: "user".to_string(),
                    content,
                });
            }
        }
    }

    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, anthropic_messages)
}

fn assistant_blocks(msg: &Message) -> Vec<ContentBlock> {
    let text = (!msg.content.is_empty()).then(|| ContentBlock::Text {
        text: msg.content.clone(),
    });
    let tool_uses = msg.tool_calls.iter().map(|call| ContentBlock::ToolUse {
        id: call.id.clone(),
        name: call.name.clone(),
        // The API wants an object; unparseable arguments degrade to `{}`
        input: serde_json::from_str::<serde_json::Value>(&call.arguments)
            .ok()
            .filter(serde_json::Value::is_object)
            .unwrap_or_else(|| serde_json::json!({})),
    });
    text.into_iter().chain(tool_uses).collect()
}

/// Convert tool definition to Anthropic format
pub(crate) fn convert_tool(tool: &ToolDefinition) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.parameters.clone(),
    }
}

pub(crate) fn into_completion_result(model: &str, response: AnthropicResponse) -> CompletionResult {
    let mut text = String::new();
    let mut thinking = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ResponseContentBlock::Text { text: part } => text.push_str(&part),
            ResponseContentBlock::Thinking { thinking: part } => thinking.push_str(&part),
            ResponseContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id,
                name,
                arguments: serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_string()),
            }),
            ResponseContentBlock::Other => {}
        }
    }

    let usage = TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens)
        .with_cached_tokens(response.usage.cache_read_input_tokens);

    CompletionResult {
        provider: ProviderName::Anthropic,
        model: model.to_string(),
        content: text,
        usage,
        finish_reason: response.stop_reason,
        reasoning: (!thinking.is_empty()).then_some(thinking),
        tool_calls,
    }
}

/// Map one Messages-API stream event to chunks
pub(crate) fn handle_stream_event(
    event: &SseEvent,
    acc: &mut StreamAccumulator,
) -> Result<Vec<StreamChunk>> {
    let parsed: StreamEvent =
        serde_json::from_str(&event.data).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    let chunks = match parsed {
        StreamEvent::MessageStart { message } => {
            acc.record_input(
                message.usage.input_tokens,
                message.usage.cache_read_input_tokens,
            );
            Vec::new()
        }
        StreamEvent::ContentBlockStart {
            index,
            content_block,
        } => {
            if let StartBlock::ToolUse { id, name } = content_block {
                acc.push_tool_call_delta(index, Some(&id), Some(&name), None);
            }
            Vec::new()
        }
        StreamEvent::ContentBlockDelta { index, delta } => match delta {
            BlockDelta::TextDelta { text } => acc.push_content(&text).into_iter().collect(),
            BlockDelta::ThinkingDelta { thinking } => {
                acc.push_reasoning(&thinking).into_iter().collect()
            }
            BlockDelta::InputJsonDelta { partial_json } => {
                acc.push_tool_call_delta(index, None, None, Some(&partial_json));
                Vec::new()
            }
            BlockDelta::Other => Vec::new(),
        },
        StreamEvent::MessageDelta { delta, usage } => {
            if let Some(reason) = delta.stop_reason {
                acc.set_finish_reason(reason);
            }
            if let Some(usage) = usage {
                acc.record_output(usage.output_tokens);
            }
            Vec::new()
        }
        StreamEvent::MessageStop => acc.finish(),
        StreamEvent::Error { error } => {
            return Err(Error::Upstream {
                status: None,
                message: format!("{}: {}", error.r#type, error.message),
            })
        }
        StreamEvent::Other => Vec::new(),
    };
    Ok(chunks)
}
