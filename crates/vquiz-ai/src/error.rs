//! Capability error types.

use thiserror::Error;

/// Result type for capability calls.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from external AI services.
///
/// All capabilities are treated as unreliable, latency-bearing, and
/// rate-limited; callers must not assume success.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited by upstream service")]
    RateLimited,

    #[error("Service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Check if the error is transient and worth retrying.
    ///
    /// Rate limits, timeouts, and server-side failures are transient; bad
    /// requests and configuration problems are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::RateLimited | AiError::Network(_) | AiError::Timeout(_) => true,
            AiError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AiError::RateLimited.is_retryable());
        assert!(AiError::timeout("transcribe timed out").is_retryable());
        assert!(AiError::Http { status: 503, body: String::new() }.is_retryable());
        assert!(AiError::Http { status: 429, body: String::new() }.is_retryable());
        assert!(!AiError::Http { status: 400, body: String::new() }.is_retryable());
        assert!(!AiError::config("missing key").is_retryable());
        assert!(!AiError::invalid_response("empty candidates").is_retryable());
        // A response merely mentioning a timeout is not itself transient.
        assert!(!AiError::invalid_response("model said: timed out").is_retryable());
    }
}
