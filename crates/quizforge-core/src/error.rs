//! Error taxonomy for the scoring and generation pipeline.
//!
//! `ProviderError` is defined here rather than in the providers crate so the
//! scoring layer can classify upstream failures for its own error mapping
//! without string matching.

use thiserror::Error;

use crate::model::{AppType, StrategyKind};

/// Errors surfaced by scoring calls and the generation decoder.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Empty or count-mismatched choices. A client data error, never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No strategy registered for the (app type, strategy) pair. A
    /// configuration error, fatal to the request.
    #[error("no scoring strategy registered for ({app_type:?}, {strategy:?})")]
    UnsupportedStrategy {
        app_type: AppType,
        strategy: StrategyKind,
    },

    /// No tier threshold covers the computed total. Indicates the tier table
    /// is missing a ceiling entry, not bad user input.
    #[error("no result tier matches total score {0}")]
    NoTierFound(i32),

    /// The external model call failed or timed out. Transient; the core
    /// performs no retry of its own and never writes the cache on this path.
    #[error("model call failed: {0}")]
    UpstreamFailure(String),

    /// The model responded but the output could not be turned into the
    /// expected shape. Distinguished from `UpstreamFailure` so callers can
    /// regenerate rather than back off.
    #[error("could not parse model output: {0}")]
    ParseFailure(String),
}

impl ScoreError {
    /// Returns `true` if retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScoreError::UpstreamFailure(_))
    }
}

/// Errors that can occur when talking to a chat model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failure_is_transient() {
        assert!(ScoreError::UpstreamFailure("timeout".into()).is_transient());
        assert!(!ScoreError::InvalidInput("empty".into()).is_transient());
        assert!(!ScoreError::NoTierFound(101).is_transient());
    }

    #[test]
    fn provider_error_permanence() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!ProviderError::Timeout(120).is_permanent());
    }
}
