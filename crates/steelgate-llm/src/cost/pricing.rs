//! Model Pricing - LLM cost information
//!
//! Rates are USD per 1M tokens.

use crate::completion::TokenUsage;
use crate::router::ProviderName;
use serde::{Deserialize, Serialize};

// ============================================================================
// Model Pricing Constants (per 1M tokens, USD)
// ============================================================================

// OpenAI
/// GPT-4o input cost per 1M tokens
pub const GPT4O_INPUT_COST: f64 = 2.50;
/// GPT-4o output cost per 1M tokens
pub const GPT4O_OUTPUT_COST: f64 = 10.00;
/// GPT-4o-mini input cost per 1M tokens
pub const GPT4O_MINI_INPUT_COST: f64 = 0.15;
/// GPT-4o-mini output cost per 1M tokens
pub const GPT4O_MINI_OUTPUT_COST: f64 = 0.60;
/// o1 input cost per 1M tokens
pub const O1_INPUT_COST: f64 = 15.00;
/// o1 output cost per 1M tokens
pub const O1_OUTPUT_COST: f64 = 60.00;
/// o1-mini input cost per 1M tokens
pub const O1_MINI_INPUT_COST: f64 = 3.00;
/// o1-mini output cost per 1M tokens
pub const O1_MINI_OUTPUT_COST: f64 = 12.00;
/// text-embedding-3-small cost per 1M tokens
pub const EMBEDDING_SMALL_COST: f64 = 0.02;
/// text-embedding-3-large cost per 1M tokens
pub const EMBEDDING_LARGE_COST: f64 = 0.13;

// DeepSeek
/// DeepSeek Chat (V3) input cost per 1M tokens
pub const DEEPSEEK_CHAT_INPUT_COST: f64 = 0.14;
/// DeepSeek Chat (V3) output cost per 1M tokens
pub const DEEPSEEK_CHAT_OUTPUT_COST: f64 = 0.28;
/// DeepSeek Reasoner (R1) input cost per 1M tokens
pub const DEEPSEEK_REASONER_INPUT_COST: f64 = 0.55;
/// DeepSeek Reasoner (R1) output cost per 1M tokens
pub const DEEPSEEK_REASONER_OUTPUT_COST: f64 = 2.19;

// Anthropic
/// Claude 3.5 Haiku input cost per 1M tokens
pub const CLAUDE_HAIKU_INPUT_COST: f64 = 0.80;
/// Claude 3.5 Haiku output cost per 1M tokens
pub const CLAUDE_HAIKU_OUTPUT_COST: f64 = 4.00;
/// Claude 3.5 Sonnet input cost per 1M tokens
pub const CLAUDE_SONNET_INPUT_COST: f64 = 3.00;
/// Claude 3.5 Sonnet output cost per 1M tokens
pub const CLAUDE_SONNET_OUTPUT_COST: f64 = 15.00;
/// Claude 3 Opus input cost per 1M tokens
pub const CLAUDE_OPUS_INPUT_COST: f64 = 15.00;
/// Claude 3 Opus output cost per 1M tokens
pub const CLAUDE_OPUS_OUTPUT_COST: f64 = 75.00;

/// Pricing information for a model (per 1M tokens)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    /// Provider name
    pub provider: ProviderName,
    /// Model name
    pub model: String,
    /// Cost per 1M input tokens (USD)
    pub input_per_million: f64,
    /// Cost per 1M output tokens (USD)
    pub output_per_million: f64,
}

impl ModelRate {
    /// Create a rate entry
    #[must_use]
    pub fn new(
        provider: ProviderName,
        model: impl Into<String>,
        input_per_million: f64,
        output_per_million: f64,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            input_per_million,
            output_per_million,
        }
    }

    /// Calculate cost for the given usage
    ///
    /// Negative rates are clamped to zero so the result is never negative.
    #[must_use]
    pub fn calculate_cost(&self, usage: &TokenUsage) -> f64 {
        let input_cost = (usage.input_tokens as f64 / 1_000_000.0) * self.input_per_million.max(0.0);
        let output_cost =
            (usage.output_tokens as f64 / 1_000_000.0) * self.output_per_million.max(0.0);
        input_cost + output_cost
    }
}

/// Default rate table
#[must_use]
pub fn default_rates() -> Vec<ModelRate> {
    use ProviderName::{Anthropic, DeepSeek, OpenAi};

    vec![
        // ====================================================================
        // OpenAI
        // ====================================================================
        ModelRate::new(OpenAi, "gpt-4o", GPT4O_INPUT_COST, GPT4O_OUTPUT_COST),
        ModelRate::new(OpenAi, "gpt-4o-mini", GPT4O_MINI_INPUT_COST, GPT4O_MINI_OUTPUT_COST),
        ModelRate::new(OpenAi, "o1", O1_INPUT_COST, O1_OUTPUT_COST),
        ModelRate::new(OpenAi, "o1-mini", O1_MINI_INPUT_COST, O1_MINI_OUTPUT_COST),
        ModelRate::new(OpenAi, "text-embedding-3-small", EMBEDDING_SMALL_COST, 0.0),
        ModelRate::new(OpenAi, "text-embedding-3-large", EMBEDDING_LARGE_COST, 0.0),
        // ====================================================================
        // DeepSeek
        // ====================================================================
        ModelRate::new(
            DeepSeek,
            "deepseek-chat",
            DEEPSEEK_CHAT_INPUT_COST,
            DEEPSEEK_CHAT_OUTPUT_COST,
        ),
        ModelRate::new(
            DeepSeek,
            "deepseek-coder",
            DEEPSEEK_CHAT_INPUT_COST,
            DEEPSEEK_CHAT_OUTPUT_COST,
        ),
        ModelRate::new(
            DeepSeek,
            "deepseek-reasoner",
            DEEPSEEK_REASONER_INPUT_COST,
            DEEPSEEK_REASONER_OUTPUT_COST,
        ),
        // ====================================================================
        // Anthropic
        // ====================================================================
        ModelRate::new(
            Anthropic,
            "claude-3-5-haiku-20241022",
            CLAUDE_HAIKU_INPUT_COST,
            CLAUDE_HAIKU_OUTPUT_COST,
        ),
        ModelRate::new(
            Anthropic,
            "claude-3-5-sonnet-20241022",
            CLAUDE_SONNET_INPUT_COST,
            CLAUDE_SONNET_OUTPUT_COST,
        ),
        ModelRate::new(
            Anthropic,
            "claude-3-opus-20240229",
            CLAUDE_OPUS_INPUT_COST,
            CLAUDE_OPUS_OUTPUT_COST,
        ),
    ]
}

/// Default rates for one provider
#[must_use]
pub fn rates_for(provider: ProviderName) -> Vec<ModelRate> {
    default_rates()
        .into_iter()
        .filter(|rate| rate.provider == provider)
        .collect()
}
