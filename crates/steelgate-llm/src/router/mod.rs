//! Router - provider selection, retry and the gateway
//!
//! # Module Structure
//!
//! - `types`: Core types (ProviderName, ProviderChoice, TaskType, QualityTier)
//! - `policy`: Model tables, task preferences and recommendations
//! - `config`: Gateway and per-provider configuration
//! - `provider`: ProviderAdapter trait definition
//! - `retry`: Retry wrapper with exponential backoff
//! - `mock`: Scripted mock adapter for testing
//! - `gateway`: AiGateway implementation

mod config;
mod gateway;
mod mock;
mod policy;
mod provider;
mod retry;
mod types;


pub use config::{GatewayConfig, ProviderSettings, ProvidersConfig};
pub use gateway::AiGateway;
pub use mock::{MockCall, MockOperation, MockProvider, MockReply, MOCK_EMBEDDING_DIMENSIONS};
pub use policy::{
    Recommendation, RecommendationReason, SelectionPolicy, TaskPreference,
    OPENAI_EMBEDDING_MODEL,
};
pub use provider::{ProviderAdapter, ProviderCapabilities};
pub use retry::{RetryPolicy, RetrySettings};
pub use types::{ProviderChoice, ProviderName, QualityTier, TaskType};
