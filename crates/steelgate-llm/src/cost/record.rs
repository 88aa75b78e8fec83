//! Usage Records
//!
//! One mutable record per `provider:model`, created on first use.

use crate::completion::TokenUsage;
use crate::router::ProviderName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of the ledger keyed by `provider:model`
pub type UsageSnapshot = BTreeMap<String, UsageRecord>;

/// Ledger key for a provider/model pair
#[must_use]
pub fn usage_key(provider: ProviderName, model: &str) -> String {
    format!("{provider}:{model}")
}

/// Accumulated usage for one provider/model pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Provider name
    pub provider: ProviderName,
    /// Model name
    pub model: String,
    /// Completed calls
    pub requests: u64,
    /// Total input tokens
    pub input_tokens: u64,
    /// Total output tokens
    pub output_tokens: u64,
    /// Total tokens
    pub total_tokens: u64,
    /// Estimated spend (USD)
    pub estimated_cost_usd: f64,
    /// Time of the most recent call
    pub last_used_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Create an empty record
    #[must_use]
    pub fn new(provider: ProviderName, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            requests: 0,
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            estimated_cost_usd: 0.0,
            last_used_at: Utc::now(),
        }
    }

    /// Fold one completed call into the record
    pub fn add(&mut self, usage: &TokenUsage, cost: f64) {
        self.requests += 1;
        self.input_tokens += u64::from(usage.input_tokens);
        self.output_tokens += u64::from(usage.output_tokens);
        self.total_tokens += u64::from(usage.total_tokens);
        self.estimated_cost_usd += cost.max(0.0);
        self.last_used_at = Utc::now();
    }
}
