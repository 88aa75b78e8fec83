//! Selection policy for provider and model routing
//!
//! The policy is built once and never mutated afterwards. It holds:
//! - model tables per (provider, task, quality)
//! - task → provider preference and fallback ordering
//! - the cost-rate table and cost calculator
//!
//! The default preferences encode a cost/quality trade-off: cost-sensitive
//! tasks (chat, code, quick, summarization) start on DeepSeek, while
//! quality-sensitive tasks (analysis, documents, creative) keep Anthropic as
//! primary.

use super::types::{ProviderName, QualityTier, TaskType};
use crate::completion::TokenUsage;
use crate::cost::{default_rates, ModelRate};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dedicated OpenAI embedding model
pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Provider ordering for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPreference {
    /// Preferred provider
    pub primary: ProviderName,
    /// Ordered alternatives when the primary is unavailable
    pub fallbacks: Vec<ProviderName>,
}

impl TaskPreference {
    /// Create a preference entry
    #[must_use]
    pub fn new(primary: ProviderName, fallbacks: impl Into<Vec<ProviderName>>) -> Self {
        Self {
            primary,
            fallbacks: fallbacks.into(),
        }
    }
}

/// Why a provider was recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// Task's configured primary provider
    Primary,
    /// First available entry of the task's fallback list
    Fallback,
    /// Neither primary nor fallbacks available; picked from what is registered
    DefaultAvailable,
}

impl RecommendationReason {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::DefaultAvailable => "default available provider",
        }
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Provider recommendation for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended provider
    pub provider: ProviderName,
    /// Balanced model for the task on that provider
    pub model: String,
    /// Why this provider was chosen
    pub reason: RecommendationReason,
}

type TierModels = Vec<(QualityTier, String)>;

/// Immutable provider/model selection policy
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    models: HashMap<ProviderName, HashMap<TaskType, TierModels>>,
    embedding_models: HashMap<ProviderName, String>,
    preferences: HashMap<TaskType, TaskPreference>,
    rates: HashMap<(ProviderName, String), ModelRate>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        use ProviderName::{Anthropic, DeepSeek, OpenAi};
        use QualityTier::{Advanced, Balanced, Fast};

        let mut policy = Self::empty();

        // ====================================================================
        // OpenAI
        // ====================================================================
        for task in [TaskType::Chat, TaskType::Documents, TaskType::Creative] {
            policy = policy
                .with_model(OpenAi, task, Fast, "gpt-4o-mini")
                .with_model(OpenAi, task, Balanced, "gpt-4o")
                .with_model(OpenAi, task, Advanced, "gpt-4o");
        }
        policy = policy
            .with_model(OpenAi, TaskType::Code, Fast, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Code, Balanced, "gpt-4o")
            .with_model(OpenAi, TaskType::Code, Advanced, "o1")
            .with_model(OpenAi, TaskType::Analysis, Fast, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Analysis, Balanced, "gpt-4o")
            .with_model(OpenAi, TaskType::Analysis, Advanced, "o1")
            .with_model(OpenAi, TaskType::Reasoning, Fast, "o1-mini")
            .with_model(OpenAi, TaskType::Reasoning, Balanced, "o1-mini")
            .with_model(OpenAi, TaskType::Reasoning, Advanced, "o1")
            .with_model(OpenAi, TaskType::Embeddings, Fast, "text-embedding-3-small")
            .with_model(OpenAi, TaskType::Embeddings, Balanced, "text-embedding-3-small")
            .with_model(OpenAi, TaskType::Embeddings, Advanced, "text-embedding-3-large")
            .with_model(OpenAi, TaskType::Quick, Fast, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Quick, Balanced, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Summarization, Fast, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Summarization, Balanced, "gpt-4o-mini")
            .with_model(OpenAi, TaskType::Summarization, Advanced, "gpt-4o")
            .with_embedding_model(OpenAi, OPENAI_EMBEDDING_MODEL);

        // ====================================================================
        // DeepSeek
        // ====================================================================
        for task in [
            TaskType::Chat,
            TaskType::Documents,
            TaskType::Creative,
            TaskType::Summarization,
        ] {
            policy = policy
                .with_model(DeepSeek, task, Fast, "deepseek-chat")
                .with_model(DeepSeek, task, Balanced, "deepseek-chat")
                .with_model(DeepSeek, task, Advanced, "deepseek-chat");
        }
        policy = policy
            .with_model(DeepSeek, TaskType::Code, Fast, "deepseek-chat")
            .with_model(DeepSeek, TaskType::Code, Balanced, "deepseek-coder")
            .with_model(DeepSeek, TaskType::Code, Advanced, "deepseek-reasoner")
            .with_model(DeepSeek, TaskType::Analysis, Fast, "deepseek-chat")
            .with_model(DeepSeek, TaskType::Analysis, Balanced, "deepseek-chat")
            .with_model(DeepSeek, TaskType::Analysis, Advanced, "deepseek-reasoner")
            .with_model(DeepSeek, TaskType::Reasoning, Balanced, "deepseek-reasoner")
            .with_model(DeepSeek, TaskType::Reasoning, Advanced, "deepseek-reasoner")
            .with_model(DeepSeek, TaskType::Quick, Fast, "deepseek-chat");

        // ====================================================================
        // Anthropic
        // ====================================================================
        for task in [TaskType::Chat, TaskType::Creative, TaskType::Summarization] {
            policy = policy
                .with_model(Anthropic, task, Fast, "claude-3-5-haiku-20241022")
                .with_model(Anthropic, task, Balanced, "claude-3-5-sonnet-20241022")
                .with_model(Anthropic, task, Advanced, "claude-3-opus-20240229");
        }
        policy = policy
            .with_model(Anthropic, TaskType::Code, Fast, "claude-3-5-haiku-20241022")
            .with_model(Anthropic, TaskType::Code, Balanced, "claude-3-5-sonnet-20241022")
            .with_model(Anthropic, TaskType::Code, Advanced, "claude-3-5-sonnet-20241022")
            .with_model(Anthropic, TaskType::Analysis, Balanced, "claude-3-5-sonnet-20241022")
            .with_model(Anthropic, TaskType::Analysis, Advanced, "claude-3-opus-20240229")
            .with_model(Anthropic, TaskType::Reasoning, Balanced, "claude-3-5-sonnet-20241022")
            .with_model(Anthropic, TaskType::Reasoning, Advanced, "claude-3-opus-20240229")
            .with_model(Anthropic, TaskType::Documents, Balanced, "claude-3-5-sonnet-20241022")
            .with_model(Anthropic, TaskType::Documents, Advanced, "claude-3-opus-20240229")
            .with_model(Anthropic, TaskType::Quick, Fast, "claude-3-5-haiku-20241022");

        // ====================================================================
        // Task preferences
        // ====================================================================
        policy = policy
            .with_preference(TaskType::Chat, TaskPreference::new(DeepSeek, [OpenAi, Anthropic]))
            .with_preference(TaskType::Code, TaskPreference::new(DeepSeek, [OpenAi, Anthropic]))
            .with_preference(TaskType::Quick, TaskPreference::new(DeepSeek, [OpenAi, Anthropic]))
            .with_preference(
                TaskType::Summarization,
                TaskPreference::new(DeepSeek, [Anthropic, OpenAi]),
            )
            .with_preference(
                TaskType::Analysis,
                TaskPreference::new(Anthropic, [OpenAi, DeepSeek]),
            )
            .with_preference(
                TaskType::Documents,
                TaskPreference::new(Anthropic, [OpenAi, DeepSeek]),
            )
            .with_preference(
                TaskType::Creative,
                TaskPreference::new(Anthropic, [OpenAi, DeepSeek]),
            )
            .with_preference(
                TaskType::Reasoning,
                TaskPreference::new(OpenAi, [Anthropic, DeepSeek]),
            )
            .with_preference(TaskType::Embeddings, TaskPreference::new(OpenAi, [DeepSeek]));

        for rate in default_rates() {
            policy = policy.with_rate(rate);
        }

        policy
    }
}

impl SelectionPolicy {
    /// Create a policy with no tables
    #[must_use]
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
            embedding_models: HashMap::new(),
            preferences: HashMap::new(),
            rates: HashMap::new(),
        }
    }

    /// Add or replace a model entry
    ///
    /// Entries for a task keep their insertion order; the first one is used
    /// when neither the requested tier nor `balanced` is defined.
    #[must_use]
    pub fn with_model(
        mut self,
        provider: ProviderName,
        task: TaskType,
        quality: QualityTier,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let tiers = self
            .models
            .entry(provider)
            .or_default()
            .entry(task)
            .or_default();
        match tiers.iter_mut().find(|(tier, _)| *tier == quality) {
            Some(entry) => entry.1 = model,
            None => tiers.push((quality, model)),
        }
        self
    }

    /// Set a provider's dedicated embedding model
    #[must_use]
    pub fn with_embedding_model(mut self, provider: ProviderName, model: impl Into<String>) -> Self {
        self.embedding_models.insert(provider, model.into());
        self
    }

    /// Set a task's provider preference
    #[must_use]
    pub fn with_preference(mut self, task: TaskType, preference: TaskPreference) -> Self {
        self.preferences.insert(task, preference);
        self
    }

    /// Add or replace a rate entry
    #[must_use]
    pub fn with_rate(mut self, rate: ModelRate) -> Self {
        self.rates.insert((rate.provider, rate.model.clone()), rate);
        self
    }

    /// Resolve the model for a provider, task and quality tier
    ///
    /// Resolution order: exact tier → `balanced` → first entry defined for
    /// the task → the provider's `chat` table. Fails with
    /// [`Error::Config`] when the provider has no table at all.
    pub fn model_for_task(
        &self,
        provider: ProviderName,
        task: TaskType,
        quality: QualityTier,
    ) -> Result<String> {
        let tasks = self
            .models
            .get(&provider)
            .ok_or_else(|| Error::Config(format!("no model table for provider {provider}")))?;

        let tiers = tasks
            .get(&task)
            .filter(|tiers| !tiers.is_empty())
            .or_else(|| tasks.get(&TaskType::Chat).filter(|tiers| !tiers.is_empty()))
            .ok_or_else(|| {
                Error::Config(format!("no model configured for {provider} task {task}"))
            })?;

        let pick = |wanted: QualityTier| {
            tiers
                .iter()
                .find(|(tier, _)| *tier == wanted)
                .map(|(_, model)| model)
        };

        pick(quality)
            .or_else(|| pick(QualityTier::Balanced))
            .or_else(|| tiers.first().map(|(_, model)| model))
            .cloned()
            .ok_or_else(|| Error::Config(format!("no model configured for {provider} task {task}")))
    }

    /// Embedding model for a provider
    ///
    /// Providers without a dedicated embedding model degrade to their fastest
    /// chat model. That is a lower-fidelity stand-in; callers that need real
    /// embeddings should pin `openai`.
    pub fn embedding_model(&self, provider: ProviderName) -> Result<String> {
        match self.embedding_models.get(&provider) {
            Some(model) => Ok(model.clone()),
            None => self.model_for_task(provider, TaskType::Chat, QualityTier::Fast),
        }
    }

    /// Preference entry for a task
    #[must_use]
    pub fn preference(&self, task: TaskType) -> Option<&TaskPreference> {
        self.preferences.get(&task)
    }

    /// Recommend a provider among `available` for a task
    ///
    /// Providers the policy cannot resolve a model for are passed over, so a
    /// recommendation always names a member of `available` and a non-empty
    /// model. `None` when no available provider has a model for the task.
    #[must_use]
    pub fn recommend_provider(
        &self,
        task: TaskType,
        available: &[ProviderName],
    ) -> Option<Recommendation> {
        let routable: Vec<ProviderName> = available
            .iter()
            .copied()
            .filter(|provider| {
                self.model_for_task(*provider, task, QualityTier::Balanced)
                    .is_ok()
            })
            .collect();
        let (provider, reason) = self.pick_provider(task, &routable)?;
        let model = self
            .model_for_task(provider, task, QualityTier::Balanced)
            .ok()?;
        Some(Recommendation {
            provider,
            model,
            reason,
        })
    }

    fn pick_provider(
        &self,
        task: TaskType,
        available: &[ProviderName],
    ) -> Option<(ProviderName, RecommendationReason)> {
        if let Some(preference) = self.preferences.get(&task) {
            if available.contains(&preference.primary) {
                return Some((preference.primary, RecommendationReason::Primary));
            }
            if let Some(fallback) = preference
                .fallbacks
                .iter()
                .find(|provider| available.contains(provider))
            {
                return Some((*fallback, RecommendationReason::Fallback));
            }
        }

        if available.contains(&ProviderName::DeepSeek) {
            return Some((ProviderName::DeepSeek, RecommendationReason::DefaultAvailable));
        }
        available
            .first()
            .map(|provider| (*provider, RecommendationReason::DefaultAvailable))
    }

    /// Rate entry for a provider/model pair
    #[must_use]
    pub fn rate(&self, provider: ProviderName, model: &str) -> Option<&ModelRate> {
        self.rates.get(&(provider, model.to_string()))
    }

    /// All rate entries for a provider
    #[must_use]
    pub fn rates_for(&self, provider: ProviderName) -> Vec<&ModelRate> {
        let mut rates: Vec<_> = self
            .rates
            .values()
            .filter(|rate| rate.provider == provider)
            .collect();
        rates.sort_by(|a, b| a.model.cmp(&b.model));
        rates
    }

    /// Estimated cost (USD) of a call
    ///
    /// Unknown provider/model pairs cost `0.0`.
    #[must_use]
    pub fn calculate_cost(&self, provider: ProviderName, model: &str, usage: &TokenUsage) -> f64 {
        self.rate(provider, model)
            .map(|rate| rate.calculate_cost(usage))
            .unwrap_or(0.0)
    }

    /// Task → quality → model table for one provider, sorted for display
    #[must_use]
    pub fn models_for(&self, provider: ProviderName) -> Vec<(TaskType, QualityTier, String)> {
        let mut rows: Vec<_> = self
            .models
            .get(&provider)
            .into_iter()
            .flat_map(|tasks| {
                tasks.iter().flat_map(|(task, tiers)| {
                    tiers
                        .iter()
                        .map(move |(tier, model)| (*task, *tier, model.clone()))
                })
            })
            .collect();
        rows.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));
        rows
    }
}
