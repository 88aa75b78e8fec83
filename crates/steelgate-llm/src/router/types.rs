//! Core types for LLM routing
//!
//! Provider names, task types and quality tiers used for provider/model
//! selection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Provider Name
// ============================================================================

/// Hosted LLM vendor with a built-in adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ProviderName {
    /// OpenAI (GPT-4o family, o1, text-embedding-3)
    OpenAi,
    /// DeepSeek (V3 chat, R1 reasoner)
    DeepSeek,
    /// Anthropic (Claude 3.5 family)
    Anthropic,
}

impl ProviderName {
    /// All built-in providers
    pub const ALL: [ProviderName; 3] = [Self::OpenAi, Self::DeepSeek, Self::Anthropic];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(Error::Config(format!("unknown provider: {other}"))),
        }
    }
}

// ============================================================================
// Provider Choice
// ============================================================================

/// Caller's provider selection: a concrete provider or `auto`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderChoice {
    /// Let the gateway pick via the selection policy
    #[default]
    Auto,
    /// Pin a provider
    Named(ProviderName),
}

impl ProviderChoice {
    /// The pinned provider, if any
    #[must_use]
    pub fn named(&self) -> Option<ProviderName> {
        match self {
            Self::Auto => None,
            Self::Named(name) => Some(*name),
        }
    }
}

impl From<ProviderName> for ProviderChoice {
    fn from(name: ProviderName) -> Self {
        Self::Named(name)
    }
}

impl FromStr for ProviderChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Named)
        }
    }
}

impl TryFrom<String> for ProviderChoice {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProviderChoice> for String {
    fn from(choice: ProviderChoice) -> Self {
        choice.to_string()
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.pad("auto"),
            Self::Named(name) => fmt::Display::fmt(name, f),
        }
    }
}

// ============================================================================
// Task Type
// ============================================================================

/// Caller-declared intent used to pick a default provider and model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TaskType {
    /// General conversation
    #[default]
    Chat,
    /// Code generation and review
    Code,
    /// Data and report analysis
    Analysis,
    /// Multi-step reasoning
    Reasoning,
    /// Long document understanding
    Documents,
    /// Vector embeddings
    Embeddings,
    /// Short, latency-sensitive answers
    Quick,
    /// Creative writing (product copy, emails)
    Creative,
    /// Text summarization
    Summarization,
}

impl TaskType {
    /// All task types
    pub const ALL: [TaskType; 9] = [
        Self::Chat,
        Self::Code,
        Self::Analysis,
        Self::Reasoning,
        Self::Documents,
        Self::Embeddings,
        Self::Quick,
        Self::Creative,
        Self::Summarization,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Code => "code",
            Self::Analysis => "analysis",
            Self::Reasoning => "reasoning",
            Self::Documents => "documents",
            Self::Embeddings => "embeddings",
            Self::Quick => "quick",
            Self::Creative => "creative",
            Self::Summarization => "summarization",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|task| task.as_str() == needle)
            .ok_or_else(|| Error::Config(format!("unknown task: {s}")))
    }
}

// ============================================================================
// Quality Tier
// ============================================================================

/// Speed/cost/capability trade-off requested by the caller
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Cheapest, lowest-latency model
    Fast,
    /// Default trade-off
    #[default]
    Balanced,
    /// Strongest model regardless of cost
    Advanced,
}

impl QualityTier {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "advanced" => Ok(Self::Advanced),
            other => Err(Error::Config(format!("unknown quality tier: {other}"))),
        }
    }
}
