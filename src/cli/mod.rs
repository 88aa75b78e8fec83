//! CLI module for Steelgate
//!
//! Provides commands:
//! - `providers`: registered providers and their capabilities
//! - `chat`: one chat completion, optionally streamed
//! - `embed`: vector embeddings for a batch of texts
//! - `recommend`: policy recommendation for a task
//! - `models`: model table and rates

use anyhow::Context;
use clap::{Parser, Subcommand};
use steelgate_llm::{AiGateway, ProviderName, TaskType};
use tracing::{info, warn};

pub mod chat;
pub mod embed;
pub mod models;
pub mod providers;

/// Steelgate AI gateway CLI
#[derive(Parser, Debug)]
#[command(name = "steelgate")]
#[command(about = "Multi-provider AI gateway")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered providers
    Providers {
        /// Probe each provider's API
        #[arg(long)]
        check: bool,
    },
    /// Run a chat completion
    Chat(chat::ChatArgs),
    /// Create embeddings
    Embed(embed::EmbedArgs),
    /// Recommend a provider for a task
    Recommend {
        /// Task type
        #[arg(short, long)]
        task: TaskType,
    },
    /// Show the model table and rates
    Models {
        /// Only this provider
        #[arg(short, long)]
        provider: Option<ProviderName>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = crate::config::load_config()?;
    let gateway =
        AiGateway::from_config(&config.gateway).context("Failed to initialize gateway")?;

    if gateway.available_providers().is_empty() {
        warn!("No provider credentials found. Set OPENAI_API_KEY, DEEPSEEK_API_KEY or ANTHROPIC_API_KEY.");
    }

    match command {
        Commands::Providers { check } => providers::run(&gateway, check).await,
        Commands::Chat(args) => {
            chat::run(&gateway, args).await?;
            log_usage(&gateway).await;
            Ok(())
        }
        Commands::Embed(args) => {
            embed::run(&gateway, args).await?;
            log_usage(&gateway).await;
            Ok(())
        }
        Commands::Recommend { task } => models::recommend(&gateway, task),
        Commands::Models { provider } => models::run(&gateway, provider),
    }
}

/// Log the usage ledger snapshot
async fn log_usage(gateway: &AiGateway) {
    for record in gateway.usage_stats().await.values() {
        info!(
            provider = %record.provider,
            model = %record.model,
            requests = record.requests,
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            cost_usd = record.estimated_cost_usd,
            "Usage"
        );
    }
}
