//! Retry with backoff for oracle calls.
//!
//! Transient failures (rate limits, 5xx, network) are retried up to 3 times
//! with growing delays; permanent failures (auth, malformed requests) fail
//! immediately. Callers degrade to documented fallback values once retries
//! are exhausted — no oracle failure ever reaches the user.

use std::time::Duration;

/// Error taxonomy for the external oracle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("rate limited")]
    RateLimited,
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed or schema-violating oracle output.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Transient errors are worth retrying; the rest fail fast.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimited | OracleError::Server(_) | OracleError::Network(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier for each subsequent delay.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
        }
    }
}

/// Run an async oracle operation with retry.
///
/// The operation is retried on transient errors until it succeeds, fails
/// permanently, or attempts are exhausted; the last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    op_name: &str,
    operation: F,
) -> Result<T, OracleError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, OracleError>>,
{
    let mut delay = config.initial_delay;
    let mut last_error = OracleError::Network("no attempts made".to_string());

    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", op_name, attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                tracing::warn!("{} failed permanently: {}", op_name, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "{} attempt {}/{} failed: {}",
                    op_name,
                    attempt,
                    config.max_attempts,
                    e
                );
                last_error = e;
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(delay).await;
            delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_factor);
        }
    }

    tracing::warn!("{}: all {} attempts exhausted", op_name, config.max_attempts);
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_config(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, OracleError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_config(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(OracleError::RateLimited)
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&fast_config(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(OracleError::Server("boom".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(OracleError::Server(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_fast() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&fast_config(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(OracleError::Unauthorized("bad key".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(OracleError::Unauthorized(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry on permanent errors");
    }
}
