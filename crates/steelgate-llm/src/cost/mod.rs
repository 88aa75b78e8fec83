//! Cost Tracking - LLM usage metering
//!
//! # Module Structure
//!
//! - `pricing`: Per-model rates and the cost formula
//! - `record`: Per `provider:model` usage records
//! - `ledger`: In-memory usage ledger

mod ledger;
mod pricing;
mod record;


pub use ledger::UsageLedger;
pub use pricing::{default_rates, rates_for, ModelRate};
pub use record::{usage_key, UsageRecord, UsageSnapshot};
