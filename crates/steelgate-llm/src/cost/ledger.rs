//! Usage Ledger - in-memory metering
//!
//! The ledger is the only state shared across concurrent calls. Updates for
//! one key happen under a single write lock, so concurrent calls never lose
//! increments. Nothing is persisted; the ledger resets on restart.

use super::record::{usage_key, UsageRecord, UsageSnapshot};
use crate::completion::TokenUsage;
use crate::router::ProviderName;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory usage counters keyed by `provider:model`
#[derive(Debug, Default)]
pub struct UsageLedger {
    records: RwLock<UsageSnapshot>,
}

impl UsageLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call
    pub async fn record(&self, provider: ProviderName, model: &str, usage: &TokenUsage, cost: f64) {
        let key = usage_key(provider, model);
        let mut records = self.records.write().await;
        let record = records
            .entry(key)
            .or_insert_with(|| UsageRecord::new(provider, model));
        record.add(usage, cost);

        debug!(
            provider = %provider,
            model = %model,
            total_tokens = usage.total_tokens,
            cost_usd = cost,
            requests = record.requests,
            "Recorded usage"
        );
    }

    /// Deep copy of all records
    pub async fn snapshot(&self) -> UsageSnapshot {
        self.records.read().await.clone()
    }

    /// Record for one provider/model pair
    pub async fn get(&self, provider: ProviderName, model: &str) -> Option<UsageRecord> {
        self.records
            .read()
            .await
            .get(&usage_key(provider, model))
            .cloned()
    }

    /// Total estimated spend across all records
    pub async fn total_cost(&self) -> f64 {
        self.records
            .read()
            .await
            .values()
            .map(|r| r.estimated_cost_usd)
            .sum()
    }

    /// Clear every record
    pub async fn reset(&self) {
        self.records.write().await.clear();
    }
}
