//! Anthropic - Claude API provider
//!
//! This module implements the Anthropic Messages API adapter using reqwest.

/// Message conversion and stream event mapping
mod convert;
/// Provider implementation
pub mod provider;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::AnthropicProvider;
pub use types::{AnthropicConfig, API_KEY_ENV, DEFAULT_MAX_TOKENS, MODELS};
