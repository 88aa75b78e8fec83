//! CLI command: `steelgate embed`

use anyhow::Context;
use clap::Args;
use steelgate_llm::{AiGateway, EmbeddingRequest, ProviderChoice};

/// Arguments for `steelgate embed`
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Provider: auto, openai, deepseek or anthropic
    #[arg(short, long, default_value = "auto")]
    pub provider: ProviderChoice,

    /// Embedding model override
    #[arg(short, long)]
    pub model: Option<String>,

    /// Texts to embed
    #[arg(required = true)]
    pub text: Vec<String>,
}

/// Run the embed subcommand.
pub async fn run(gateway: &AiGateway, args: EmbedArgs) -> anyhow::Result<()> {
    let mut request = EmbeddingRequest::new(args.text).with_provider(args.provider);
    request.model = args.model;

    let result = gateway
        .embeddings(request)
        .await
        .context("Embedding request failed")?;

    println!();
    println!("  {} / {}", result.provider, result.model);
    println!("  {}", "-".repeat(40));
    for (i, vector) in result.embeddings.iter().enumerate() {
        let preview: Vec<String> = vector.iter().take(4).map(|v| format!("{v:.4}")).collect();
        println!(
            "  #{i:<3} {} dims  [{}, ...]",
            vector.len(),
            preview.join(", ")
        );
    }
    println!("  {}", "-".repeat(40));
    println!("  {} tokens", result.usage.total_tokens);
    println!();
    Ok(())
}
