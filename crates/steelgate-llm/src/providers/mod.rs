//! Provider adapters
//!
//! OpenAI and DeepSeek share the OpenAI-compatible wire layer in `compat`;
//! Anthropic speaks the Messages API.

/// Anthropic provider
pub mod anthropic;
pub(crate) mod compat;
/// DeepSeek provider
pub mod deepseek;
/// OpenAI provider
pub mod openai;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use deepseek::{DeepSeekConfig, DeepSeekProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};

use crate::error::Result;
use crate::router::{ProviderAdapter, ProviderName, ProviderSettings};
use std::sync::Arc;

/// Environment variable consulted for a provider's API key
#[must_use]
pub fn api_key_env(provider: ProviderName) -> &'static str {
    match provider {
        ProviderName::OpenAi => openai::API_KEY_ENV,
        ProviderName::DeepSeek => deepseek::API_KEY_ENV,
        ProviderName::Anthropic => anthropic::API_KEY_ENV,
    }
}

/// Build the adapter for `provider` from its settings and a resolved key
pub fn build_adapter(
    provider: ProviderName,
    api_key: String,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ProviderAdapter>> {
    let adapter: Arc<dyn ProviderAdapter> = match provider {
        ProviderName::OpenAi => Arc::new(OpenAiProvider::new(OpenAiConfig::from_settings(
            api_key, settings,
        ))?),
        ProviderName::DeepSeek => Arc::new(DeepSeekProvider::new(
            DeepSeekConfig::from_settings(api_key, settings),
        )?),
        ProviderName::Anthropic => Arc::new(AnthropicProvider::new(
            AnthropicConfig::from_settings(api_key, settings),
        )?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_env_names() {
        assert_eq!(api_key_env(ProviderName::OpenAi), "OPENAI_API_KEY");
        assert_eq!(api_key_env(ProviderName::DeepSeek), "DEEPSEEK_API_KEY");
        assert_eq!(api_key_env(ProviderName::Anthropic), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_build_adapter_names_match() {
        let settings = ProviderSettings::default();
        for provider in ProviderName::ALL {
            let adapter = build_adapter(provider, "sk-test-0123456789".into(), &settings).unwrap();
            assert_eq!(adapter.name(), provider);
        }
    }
}
