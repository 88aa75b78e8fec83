//! AI gateway implementation
//!
//! [`AiGateway`] owns the adapter registry and the usage ledger, resolves
//! every request through the [`SelectionPolicy`], runs adapter calls under
//! the [`RetryPolicy`] and fails over once when the provider was picked
//! automatically.

use super::config::GatewayConfig;
use super::policy::{Recommendation, SelectionPolicy};
use super::provider::{ProviderAdapter, ProviderCapabilities};
use super::retry::RetryPolicy;
use super::types::{ProviderChoice, ProviderName, QualityTier, TaskType};
use crate::completion::{
    ChunkStream, CompletionRequest, CompletionResult, EmbeddingRequest, EmbeddingResult,
    StreamChunk,
};
use crate::cost::{UsageLedger, UsageSnapshot};
use crate::error::{Error, Result};
use crate::providers;
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolved provider, adapter and model for one call
struct Route {
    provider: ProviderName,
    adapter: Arc<dyn ProviderAdapter>,
    model: String,
    pinned: bool,
}

/// Multi-provider AI gateway
pub struct AiGateway {
    providers: HashMap<ProviderName, Arc<dyn ProviderAdapter>>,
    policy: Arc<SelectionPolicy>,
    ledger: Arc<UsageLedger>,
    retry: RetryPolicy,
}

impl fmt::Debug for AiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiGateway")
            .field("providers", &self.available_providers())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Default for AiGateway {
    fn default() -> Self {
        Self::new(SelectionPolicy::default())
    }
}

impl AiGateway {
    /// Create a gateway with no registered adapters
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            providers: HashMap::new(),
            policy: Arc::new(policy),
            ledger: Arc::new(UsageLedger::new()),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a gateway from configuration
    ///
    /// An adapter is registered only when its provider is enabled and a
    /// credential is available (config or environment). Missing credentials
    /// are not an error.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mut gateway = Self::default().with_retry(config.retry.into());

        for provider in ProviderName::ALL {
            let settings = config.providers.get(provider);
            if !settings.enabled {
                debug!(%provider, "provider disabled by configuration");
                continue;
            }
            let Some(api_key) = settings.resolve_api_key(providers::api_key_env(provider)) else {
                debug!(%provider, "no credential, provider not registered");
                continue;
            };
            gateway.register(providers::build_adapter(provider, api_key, settings)?);
        }

        info!(providers = ?gateway.available_providers(), "gateway initialized");
        Ok(gateway)
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register an adapter (builder form)
    #[must_use]
    pub fn with_provider(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Register an adapter, replacing any adapter with the same name
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let name = adapter.name();
        if self.providers.insert(name, adapter).is_some() {
            warn!(provider = %name, "replacing registered adapter");
        }
    }

    /// The selection policy
    #[must_use]
    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// The retry policy
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ========================================================================
    // Registry queries
    // ========================================================================

    /// Registered providers in canonical order
    #[must_use]
    pub fn available_providers(&self) -> Vec<ProviderName> {
        ProviderName::ALL
            .into_iter()
            .filter(|name| self.providers.contains_key(name))
            .collect()
    }

    /// Whether an adapter is registered for `name`
    #[must_use]
    pub fn is_provider_available(&self, name: ProviderName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Capabilities of a registered adapter
    #[must_use]
    pub fn provider_capabilities(&self, name: ProviderName) -> Option<ProviderCapabilities> {
        self.providers.get(&name).map(|adapter| adapter.capabilities())
    }

    /// Policy recommendation among registered providers
    #[must_use]
    pub fn recommend(&self, task: TaskType) -> Option<Recommendation> {
        self.policy
            .recommend_provider(task, &self.available_providers())
    }

    /// Probe every registered adapter concurrently
    pub async fn test_connections(&self) -> BTreeMap<ProviderName, bool> {
        let probes = self.providers.iter().map(|(name, adapter)| async move {
            let ok = adapter.test_connection().await;
            if !ok {
                warn!(provider = %name, "connection test failed");
            }
            (*name, ok)
        });
        futures::future::join_all(probes).await.into_iter().collect()
    }

    // ========================================================================
    // Usage
    // ========================================================================

    /// Deep copy of the usage ledger
    pub async fn usage_stats(&self) -> UsageSnapshot {
        self.ledger.snapshot().await
    }

    /// Clear every usage record
    pub async fn reset_usage_stats(&self) {
        self.ledger.reset().await;
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Chat completion with retry and single-level fallback
    #[instrument(skip(self, request), fields(task = %request.task, provider = %request.provider))]
    pub async fn chat_completion(&self, request: CompletionRequest) -> Result<CompletionResult> {
        let route = self.resolve(
            request.provider,
            request.task,
            request.quality,
            request.model.as_deref(),
            None,
        )?;

        let err = match self.execute_chat(&route, &request).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        if route.pinned || !err.is_retryable() {
            return Err(err);
        }

        // Fallback ignores the caller's model override: it names a model of
        // the failed provider.
        let fallback = match self.resolve(
            ProviderChoice::Auto,
            request.task,
            request.quality,
            None,
            Some(route.provider),
        ) {
            Ok(fallback) => fallback,
            Err(_) => {
                debug!(provider = %route.provider, "no fallback provider available");
                return Err(err);
            }
        };

        info!(
            from = %route.provider,
            to = %fallback.provider,
            model = %fallback.model,
            error = %err,
            "falling back to another provider"
        );
        self.execute_chat(&fallback, &request).await
    }

    /// Streaming chat completion
    ///
    /// No retry and no fallback. Usage is recorded when the terminal chunk
    /// arrives, before it is handed to the caller; streams dropped earlier
    /// leave no record.
    #[instrument(skip(self, request), fields(task = %request.task, provider = %request.provider))]
    pub async fn stream_chat_completion(&self, request: CompletionRequest) -> Result<ChunkStream> {
        let route = self.resolve(
            request.provider,
            request.task,
            request.quality,
            request.model.as_deref(),
            None,
        )?;

        debug!(provider = %route.provider, model = %route.model, "dispatching stream");
        let mut upstream = route
            .adapter
            .stream_chat_completion(&route.model, &request.messages, &request.options)
            .await?;

        let ledger = Arc::clone(&self.ledger);
        let policy = Arc::clone(&self.policy);
        let provider = route.provider;
        let model = route.model;

        let stream = async_stream::stream! {
            while let Some(item) = upstream.next().await {
                let done = matches!(item, Ok(StreamChunk::Complete { .. }));
                if let Ok(StreamChunk::Complete { usage, .. }) = &item {
                    let cost = policy.calculate_cost(provider, &model, usage);
                    ledger.record(provider, &model, usage, cost).await;
                }
                yield item;
                if done {
                    break;
                }
            }
        };
        Ok(Box::pin(stream))
    }

    /// Embeddings
    ///
    /// A pinned, registered provider is used as is; otherwise OpenAI, then
    /// DeepSeek. Providers without embedding support fail before any upstream
    /// call. Retried, never failed over.
    #[instrument(skip(self, request), fields(provider = %request.provider, inputs = request.input.len()))]
    pub async fn embeddings(&self, request: EmbeddingRequest) -> Result<EmbeddingResult> {
        let provider = request
            .provider
            .named()
            .filter(|name| self.is_provider_available(*name))
            .or_else(|| {
                [ProviderName::OpenAi, ProviderName::DeepSeek]
                    .into_iter()
                    .find(|name| self.is_provider_available(*name))
            })
            .ok_or_else(|| Error::NoProvider("no embedding provider registered".to_string()))?;

        let adapter = self.adapter(provider)?;
        if !adapter.capabilities().supports_embeddings {
            return Err(Error::capability(provider.as_str(), "embeddings"));
        }

        let model = match &request.model {
            Some(model) => model.clone(),
            None => self.policy.embedding_model(provider)?,
        };

        debug!(%provider, %model, "dispatching embeddings");
        let mut result = self
            .retry
            .run(provider, || adapter.create_embeddings(&model, &request.input))
            .await?;

        result.provider = provider;
        result.model = model;
        self.record_usage(provider, &result.model, &result.usage)
            .await;
        Ok(result)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn adapter(&self, provider: ProviderName) -> Result<Arc<dyn ProviderAdapter>> {
        self.providers
            .get(&provider)
            .cloned()
            .ok_or_else(|| Error::NoProvider(format!("{provider} is not registered")))
    }

    fn resolve(
        &self,
        choice: ProviderChoice,
        task: TaskType,
        quality: QualityTier,
        model_override: Option<&str>,
        exclude: Option<ProviderName>,
    ) -> Result<Route> {
        let pinned = choice
            .named()
            .filter(|name| Some(*name) != exclude && self.is_provider_available(*name));

        let (provider, is_pinned) = match pinned {
            Some(name) => (name, true),
            None => {
                if let Some(name) = choice.named() {
                    if Some(name) != exclude {
                        info!(provider = %name, "requested provider not registered, selecting automatically");
                    }
                }
                let available: Vec<_> = self
                    .available_providers()
                    .into_iter()
                    .filter(|name| Some(*name) != exclude)
                    .collect();
                let recommendation = self
                    .policy
                    .recommend_provider(task, &available)
                    .ok_or_else(|| {
                        Error::NoProvider(format!("no provider available for task {task}"))
                    })?;
                debug!(
                    provider = %recommendation.provider,
                    reason = %recommendation.reason,
                    "provider selected"
                );
                (recommendation.provider, false)
            }
        };

        let model = match model_override {
            Some(model) if !model.trim().is_empty() => model.to_string(),
            _ => self.policy.model_for_task(provider, task, quality)?,
        };

        Ok(Route {
            provider,
            adapter: self.adapter(provider)?,
            model,
            pinned: is_pinned,
        })
    }

    async fn execute_chat(
        &self,
        route: &Route,
        request: &CompletionRequest,
    ) -> Result<CompletionResult> {
        debug!(provider = %route.provider, model = %route.model, "dispatching chat completion");
        let mut result = self
            .retry
            .run(route.provider, || {
                route
                    .adapter
                    .chat_completion(&route.model, &request.messages, &request.options)
            })
            .await?;

        result.provider = route.provider;
        result.model = route.model.clone();
        self.record_usage(route.provider, &route.model, &result.usage)
            .await;
        Ok(result)
    }

    async fn record_usage(
        &self,
        provider: ProviderName,
        model: &str,
        usage: &crate::completion::TokenUsage,
    ) {
        let cost = self.policy.calculate_cost(provider, model, usage);
        self.ledger.record(provider, model, usage, cost).await;
    }
}
