//! Configuration types for the gateway
//!
//! Deserialized from the `[gateway]` section of the application config.

use super::retry::RetrySettings;
use super::types::ProviderName;
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Provider Settings
// ============================================================================

/// Settings for one provider adapter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether the adapter may be registered at all
    pub enabled: bool,
    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Default `max_tokens` (Anthropic requires one)
    pub default_max_tokens: Option<u32>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            timeout_ms: None,
            default_max_tokens: None,
        }
    }
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_deref().map(mask_api_key))
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl ProviderSettings {
    /// Resolve the credential: explicit key, else `env_var`
    ///
    /// Empty strings count as absent.
    #[must_use]
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Per-provider settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI
    pub openai: ProviderSettings,
    /// DeepSeek
    pub deepseek: ProviderSettings,
    /// Anthropic
    pub anthropic: ProviderSettings,
}

impl ProvidersConfig {
    /// Settings for a provider
    #[must_use]
    pub fn get(&self, provider: ProviderName) -> &ProviderSettings {
        match provider {
            ProviderName::OpenAi => &self.openai,
            ProviderName::DeepSeek => &self.deepseek,
            ProviderName::Anthropic => &self.anthropic,
        }
    }
}

// ============================================================================
// Gateway Configuration
// ============================================================================

/// Gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Retry wrapper settings
    pub retry: RetrySettings,
    /// Adapter settings
    pub providers: ProvidersConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.providers.openai.enabled);
        assert!(config.providers.get(ProviderName::Anthropic).api_key.is_none());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"retry":{"max_attempts":5},"providers":{"deepseek":{"enabled":false}}}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert!(!config.providers.deepseek.enabled);
        assert!(config.providers.openai.enabled);
    }

    #[test]
    fn test_explicit_key_wins_and_debug_masks() {
        let settings = ProviderSettings {
            api_key: Some("sk-explicit-1234567890".into()),
            ..ProviderSettings::default()
        };
        assert_eq!(
            settings.resolve_api_key("STEELGATE_TEST_UNSET_KEY").as_deref(),
            Some("sk-explicit-1234567890")
        );
        let debug_str = format!("{settings:?}");
        assert!(!debug_str.contains("explicit-123456"));
    }

    #[test]
    fn test_blank_key_is_absent() {
        let settings = ProviderSettings {
            api_key: Some("  ".into()),
            ..ProviderSettings::default()
        };
        assert!(settings.resolve_api_key("STEELGATE_TEST_UNSET_KEY").is_none());
    }
}
