//! CLI command: `steelgate chat`
//!
//! Sends one prompt through the gateway and prints the answer, streaming it
//! incrementally with `--stream`.

use anyhow::Context;
use clap::Args;
use futures::StreamExt;
use std::io::Write;
use steelgate_llm::{
    AiGateway, CompletionRequest, Message, ProviderChoice, QualityTier, StreamChunk, TaskType,
    TokenUsage,
};

/// Arguments for `steelgate chat`
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Provider: auto, openai, deepseek or anthropic
    #[arg(short, long, default_value = "auto")]
    pub provider: ProviderChoice,

    /// Task type used for routing
    #[arg(short, long, default_value = "chat")]
    pub task: TaskType,

    /// Quality tier: fast, balanced or advanced
    #[arg(short, long, default_value = "balanced")]
    pub quality: QualityTier,

    /// Model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Print the answer as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Prompt text
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

impl ChatArgs {
    fn to_request(&self) -> CompletionRequest {
        let mut request = CompletionRequest::new(self.task)
            .with_provider(self.provider)
            .with_quality(self.quality);

        if let Some(system) = &self.system {
            request = request.with_message(Message::system(system.as_str()));
        }
        request = request.with_message(Message::user(self.prompt.join(" ")));

        if let Some(model) = &self.model {
            request = request.with_model(model.as_str());
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

/// Run the chat subcommand.
pub async fn run(gateway: &AiGateway, args: ChatArgs) -> anyhow::Result<()> {
    let request = args.to_request();

    if !args.stream {
        let result = gateway
            .chat_completion(request)
            .await
            .context("Chat completion failed")?;

        if let Some(reasoning) = &result.reasoning {
            eprintln!("[reasoning] {reasoning}");
        }
        println!("{}", result.content);
        for call in &result.tool_calls {
            println!("[tool call] {}({})", call.name, call.arguments);
        }
        print_usage(&format!("{} / {}", result.provider, result.model), &result.usage);
        return Ok(());
    }

    let mut stream = gateway
        .stream_chat_completion(request)
        .await
        .context("Failed to start stream")?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        match chunk.context("Stream interrupted")? {
            StreamChunk::Content { delta, .. } => {
                print!("{delta}");
                stdout.flush()?;
            }
            StreamChunk::Reasoning { delta, .. } => eprint!("{delta}"),
            StreamChunk::ToolCall { call } => {
                println!("\n[tool call] {}({})", call.name, call.arguments);
            }
            StreamChunk::Complete { usage, .. } => {
                println!();
                print_usage("stream", &usage);
            }
        }
    }
    Ok(())
}

fn print_usage(label: &str, usage: &TokenUsage) {
    eprintln!(
        "\n  {label}: {} in, {} out, {} total{}",
        usage.input_tokens,
        usage.output_tokens,
        usage.total_tokens,
        usage
            .cached_tokens
            .map(|c| format!(" ({c} cached)"))
            .unwrap_or_default()
    );
}
