//! Retry utilities with exponential backoff.
//!
//! Capability calls are the only retried operations: transient upstream
//! failures (rate limits, network, 5xx) get bounded retries with backoff,
//! permanent errors fail immediately.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use vquiz_ai::{AiError, AiResult};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            operation_name: "capability_call".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Calculate delay for a given attempt number.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Execute a capability call with bounded retry and a per-call timeout.
///
/// Only errors flagged retryable by `AiError::is_retryable` are retried; a
/// timed-out call becomes `AiError::Timeout` and counts as one failed
/// (retryable) attempt.
pub async fn call_with_retry<F, Fut, T>(
    config: &RetryConfig,
    call_timeout: Duration,
    operation: F,
) -> AiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AiResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        let result = match tokio::time::timeout(call_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(AiError::timeout(format!(
                "{} timed out after {:?}",
                config.operation_name, call_timeout
            ))),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation_caps_at_max() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert!(config.delay_for_attempt(10) <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let config = RetryConfig::new("test");
        let calls = AtomicU32::new(0);

        let result = call_with_retry(&config, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AiError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = call_with_retry(&config, Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AiError::RateLimited)
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: AiResult<()> = call_with_retry(&config, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AiError::Http {
                    status: 400,
                    body: "bad request".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_timeout_counts_as_attempt() {
        let config = RetryConfig::new("test")
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: AiResult<()> = call_with_retry(&config, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(AiError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_retried() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = call_with_retry(&config, Duration::from_millis(20), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    // First attempt hangs past the per-call timeout.
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, AiError>("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
