use super::convert::{convert_messages, handle_stream_event};
use super::types::{AnthropicContent, ContentBlock, DEFAULT_TIMEOUT};
use super::{AnthropicConfig, AnthropicProvider, DEFAULT_MAX_TOKENS};
use crate::completion::{ChatOptions, StreamChunk};
use crate::error::Error;
use crate::message::Message;
use crate::router::{ProviderAdapter, ProviderName};
use crate::stream::{SseEvent, StreamAccumulator};
use crate::tools::ToolCall;
use futures::StreamExt;
use mockito::Matcher;
use std::time::Duration;

fn provider_for(server: &mockito::Server) -> AnthropicProvider {
    AnthropicProvider::new(AnthropicConfig::new("sk-ant-test-0123456789").with_base_url(server.url()))
        .unwrap()
}

#[test]
fn test_config_builder() {
    let config = AnthropicConfig::new("test-key")
        .with_max_tokens(2048)
        .with_timeout(Duration::from_secs(30));

    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.default_max_tokens, 2048);
    assert_eq!(config.timeout, Duration::from_secs(30));

    let config = AnthropicConfig::new("test-key");
    assert_eq!(config.default_max_tokens, DEFAULT_MAX_TOKENS);
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
}

#[test]
fn test_config_debug_masks_key() {
    let config = AnthropicConfig::new("sk-ant-REDACTED");
    let debug_str = format!("{:?}", config);

    assert!(!debug_str.contains("1234567890"));
    assert!(debug_str.contains("sk-a...ghij"));
}

#[test]
fn test_message_conversion_hoists_system() {
    let messages = vec![
        Message::system("You are a mill assistant"),
        Message::user("Hello"),
        Message::system("Answer in metric units"),
        Message::assistant("Hi there!"),
    ];

    let (system, converted) = convert_messages(&messages);

    assert_eq!(
        system.as_deref(),
        Some("You are a mill assistant\n\nAnswer in metric units")
    );
    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].role, "user");
    assert_eq!(converted[1].role, "assistant");
}

#[test]
fn test_tool_messages_become_user_turns() {
    let mut untracked = Message::tool_response("x", "42 tonnes");
    untracked.tool_call_id = None;
    let messages = vec![Message::tool_response("toolu_1", "{\"ok\":true}"), untracked];

    let (system, converted) = convert_messages(&messages);
    assert!(system.is_none());
    assert!(converted.iter().all(|m| m.role == "user"));

    match &converted[0].content {
        AnthropicContent::Blocks(blocks) => match &blocks[0] {
            ContentBlock::ToolResult { tool_use_id, .. } => assert_eq!(tool_use_id, "toolu_1"),
            other => panic!("expected tool result, got {other:?}"),
        },
        other => panic!("expected blocks, got {other:?}"),
    }
    match &converted[1].content {
        AnthropicContent::Text(text) => assert_eq!(text, "Tool result: 42 tonnes"),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn test_assistant_tool_calls_become_tool_use_blocks() {
    let calls = vec![
        ToolCall {
            id: "toolu_1".into(),
            name: "coil_status".into(),
            arguments: r#"{"coil":"C-88"}"#.into(),
        },
        ToolCall {
            id: "toolu_2".into(),
            name: "ladle_temp".into(),
            arguments: String::new(),
        },
    ];
    let messages = vec![
        Message::user("Where is C-88?"),
        Message::assistant_with_tool_calls("Checking.", calls),
        Message::tool_response("toolu_1", "bay 4"),
    ];

    let (_, converted) = convert_messages(&messages);
    assert_eq!(converted.len(), 3);
    assert_eq!(converted[1].role, "assistant");

    let json = serde_json::to_value(&converted[1].content).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"type": "text", "text": "Checking."},
            {"type": "tool_use", "id": "toolu_1", "name": "coil_status", "input": {"coil": "C-88"}},
            {"type": "tool_use", "id": "toolu_2", "name": "ladle_temp", "input": {}}
        ])
    );
    let json = serde_json::to_value(&converted[2].content).unwrap();
    assert_eq!(json[0]["type"], "tool_result");
    assert_eq!(json[0]["tool_use_id"], "toolu_1");
}

#[tokio::test]
async fn test_chat_completion_requires_max_tokens() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test-0123456789")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": DEFAULT_MAX_TOKENS,
            "system": "Be brief"
        })))
        .with_status(200)
        .with_body(
            r#"{
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "claude-3-5-sonnet-20241022",
                "content": [
                    {"type": "text", "text": "Scrap rate "},
                    {"type": "text", "text": "is 2.1%."}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 25, "output_tokens": 8, "cache_read_input_tokens": 20}
            }"#,
        )
        .create_async()
        .await;

    let result = provider_for(&server)
        .chat_completion(
            "claude-3-5-sonnet-20241022",
            &[Message::system("Be brief"), Message::user("Scrap rate?")],
            &ChatOptions::default(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.provider, ProviderName::Anthropic);
    assert_eq!(result.content, "Scrap rate is 2.1%.");
    assert_eq!(result.finish_reason.as_deref(), Some("end_turn"));
    assert_eq!(result.usage.total_tokens, 33);
    assert_eq!(result.usage.cached_tokens, Some(20));
    assert!(result.reasoning.is_none());
}

#[tokio::test]
async fn test_tool_use_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            r#"{"content":[{"type":"tool_use","id":"toolu_9","name":"coil_status","input":{"coil":"C-88"}}],
                "stop_reason":"tool_use","usage":{"input_tokens":10,"output_tokens":4}}"#,
        )
        .create_async()
        .await;

    let result = provider_for(&server)
        .chat_completion(
            "claude-3-5-haiku-20241022",
            &[Message::user("Where is C-88?")],
            &ChatOptions::default(),
        )
        .await
        .unwrap();

    assert!(result.has_tool_calls());
    assert_eq!(result.tool_calls[0].id, "toolu_9");
    assert_eq!(result.tool_calls[0].arguments, r#"{"coil":"C-88"}"#);
}

#[tokio::test]
async fn test_error_body_reaches_caller() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body(
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        )
        .create_async()
        .await;

    let err = provider_for(&server)
        .chat_completion("claude-3-5-haiku-20241022", &[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();

    match err {
        Error::ClientInput { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "authentication_error: invalid x-api-key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_overloaded_is_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
        .create_async()
        .await;

    let err = provider_for(&server)
        .chat_completion("claude-3-5-haiku-20241022", &[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(529));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_embeddings_unsupported() {
    let provider =
        AnthropicProvider::new(AnthropicConfig::new("sk-ant-test-0123456789")).unwrap();
    assert!(!provider.capabilities().supports_embeddings);
    let err = provider
        .create_embeddings("claude-3-5-haiku-20241022", &["slab".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Capability { .. }));
}

#[tokio::test]
async fn test_stream_messages() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"usage\":{\"input_tokens\":14,\"output_tokens\":1}}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "event: ping\n",
        "data: {\"type\":\"ping\"}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Line 3 \"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"is down.\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":6}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    let mock = server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let chunks: Vec<StreamChunk> = provider_for(&server)
        .stream_chat_completion(
            "claude-3-5-haiku-20241022",
            &[Message::user("Status?")],
            &ChatOptions::default(),
        )
        .await
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(chunks.len(), 3);
    assert!(matches!(
        &chunks[1],
        StreamChunk::Content { aggregate, .. } if aggregate == "Line 3 is down."
    ));
    assert_eq!(
        chunks[2],
        StreamChunk::Complete {
            usage: crate::completion::TokenUsage::new(14, 6),
            finish_reason: Some("end_turn".into())
        }
    );
}

#[test]
fn test_stream_thinking_and_error_events() {
    let mut acc = StreamAccumulator::new();
    let event = |data: &str| SseEvent {
        event: None,
        data: data.to_string(),
    };

    let chunks = handle_stream_event(
        &event(r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"Check gauge."}}"#),
        &mut acc,
    )
    .unwrap();
    assert!(matches!(&chunks[0], StreamChunk::Reasoning { delta, .. } if delta == "Check gauge."));

    let err = handle_stream_event(
        &event(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
        &mut acc,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: None, .. }));
}

#[tokio::test]
async fn test_stream_tool_use_blocks() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":30,\"output_tokens\":1}}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Checking.\"}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_9\",\"name\":\"coil_status\",\"input\":{}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"coil\\\": \"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"\\\"C-88\\\"}\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"type\":\"content_block_stop\",\"index\":1}\n\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"tool_use\"},\"usage\":{\"output_tokens\":21}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let chunks: Vec<StreamChunk> = provider_for(&server)
        .stream_chat_completion(
            "claude-3-5-haiku-20241022",
            &[Message::user("Where is C-88?")],
            &ChatOptions::default(),
        )
        .await
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    assert!(matches!(&chunks[0], StreamChunk::Content { delta, .. } if delta == "Checking."));
    match &chunks[1] {
        StreamChunk::ToolCall { call } => {
            assert_eq!(call.id, "toolu_9");
            assert_eq!(call.name, "coil_status");
            let input: serde_json::Value = call.parse_arguments().unwrap();
            assert_eq!(input, serde_json::json!({"coil": "C-88"}));
        }
        other => panic!("unexpected chunk: {other:?}"),
    }
    assert!(matches!(
        &chunks[2],
        StreamChunk::Complete { usage, finish_reason }
            if usage.total_tokens == 51 && finish_reason.as_deref() == Some("tool_use")
    ));
}
