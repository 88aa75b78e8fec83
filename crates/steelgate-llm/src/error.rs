//! Error types for steelgate-llm

use thiserror::Error;

/// Gateway error type
///
/// Every gateway call ends either in success or in exactly one of these
/// variants. [`Error::is_retryable`] drives the retry wrapper and the
/// single-level fallback.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Unknown provider/task/quality lookup or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream rejected the request (HTTP 4xx): bad input, model or credentials
    #[error("upstream rejected request ({status}): {message}")]
    ClientInput {
        /// HTTP status code
        status: u16,
        /// Sanitized upstream message
        message: String,
    },

    /// Transient upstream failure (HTTP 5xx or unexpected status)
    #[error("upstream error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        /// HTTP status code, if one was received
        status: Option<u16>,
        /// Sanitized upstream message
        message: String,
    },

    /// Per-call timeout expired
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Operation not supported by the chosen provider
    #[error("{provider} does not support {operation}")]
    Capability {
        /// Provider name
        provider: String,
        /// Operation name
        operation: String,
    },

    /// No provider could be resolved for the call
    #[error("no provider available: {0}")]
    NoProvider(String),
}

impl Error {
    /// Classify an HTTP failure status
    ///
    /// Statuses in `[400, 500)` are client errors and never retried;
    /// everything else is treated as transient.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            Self::ClientInput { status, message }
        } else {
            Self::Upstream {
                status: Some(status),
                message,
            }
        }
    }

    /// Map a transport error from reqwest
    #[must_use]
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Build a capability error
    #[must_use]
    pub fn capability(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Capability {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    /// HTTP-style status attached to this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ClientInput { status, .. } => Some(*status),
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the retry wrapper may attempt the call again
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { .. }
            | Self::Timeout(_)
            | Self::Network(_)
            | Self::InvalidResponse(_) => true,
            Self::ClientInput { .. }
            | Self::Config(_)
            | Self::Capability { .. }
            | Self::NoProvider(_) => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
