//! Retry wrapper with exponential backoff
//!
//! Wraps one adapter call. Client errors and non-retryable kinds fail
//! immediately; everything else waits `min(base * 2^i, max)` before attempt
//! `i + 1`. Delays go through `tokio::time::sleep`, so they never block a
//! worker and follow the paused test clock.

use super::types::ProviderName;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry settings as they appear in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt (ms)
    pub base_delay_ms: u64,
    /// Upper bound for any single delay (ms)
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

/// Retry policy applied to every non-streaming adapter call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails non-retryably or attempts
    /// run out; the last error is returned unchanged
    pub async fn run<T, F, Fut>(&self, provider: ProviderName, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(%provider, attempt = attempt + 1, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let last = attempt + 1 >= self.max_attempts;
                    if last || !err.is_retryable() {
                        debug!(
                            %provider,
                            attempt = attempt + 1,
                            error = %err,
                            "call failed, no more retries"
                        );
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        %provider,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
