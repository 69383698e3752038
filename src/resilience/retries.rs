//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failure is retryable (status or transport kind)
//! - Execute retries with exponential backoff + jitter
//! - Report exhaustion with the last failure attached
//!
//! # Design Decisions
//! - Callers only wrap idempotent operations; the policy does not inspect methods
//! - Retryable: 408, 429, 500, 502, 503, 504, connect failures, timeouts
//! - Backoff doubles per attempt with up to 10% jitter

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms, config.max_delay_ms)
    }

    /// A single attempt, no retrying.
    pub fn none() -> Self {
        Self::new(1, 0, 0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (1-based): doubling from the base
    /// delay, capped at the max delay, plus up to 10% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let capped = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let jitter = match capped / 10 {
            0 => 0,
            range => fastrand::u64(0..range),
        };
        Duration::from_millis(capped + jitter)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Non-retryable errors, and any error of a single-attempt policy, are
    /// returned unchanged. When every attempt fails with a retryable error the
    /// last one is wrapped in `RetriesExhausted`.
    pub async fn execute<R, F, Fut>(&self, uri: &Url, mut operation: F) -> ClientResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<R>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() || self.max_attempts == 1 => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        uri = %uri,
                        attempts = attempt,
                        error = %e,
                        "Retries exhausted"
                    );
                    return Err(ClientError::RetriesExhausted {
                        uri: uri.to_string(),
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        uri = %uri,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn uri() -> Url {
        Url::parse("http://host/parents/1").unwrap()
    }

    fn server_error(status: StatusCode) -> ClientError {
        ClientError::Server(ServerError::from_response(status, ""))
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 1, 5);
        let result = policy
            .execute(&uri(), || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error(StatusCode::SERVICE_UNAVAILABLE))
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();
        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, 1, 5);
        let err = policy
            .execute(&uri(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(server_error(StatusCode::BAD_REQUEST))
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_wraps_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, 1, 5);
        let err = policy
            .execute(&uri(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(server_error(StatusCode::BAD_GATEWAY))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_returns_error_unchanged() {
        let err = RetryPolicy::none()
            .execute(&uri(), || async {
                Err::<(), _>(server_error(StatusCode::SERVICE_UNAVAILABLE))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server(_)));
    }

    #[test]
    fn test_backoff_doubles_until_capped() {
        let policy = RetryPolicy::new(5, 100, 1000);
        assert!((100..110).contains(&policy.backoff(1).as_millis()));
        assert!((200..220).contains(&policy.backoff(2).as_millis()));
        assert!((1000..1100).contains(&policy.backoff(10).as_millis()));
        assert!((1000..1100).contains(&policy.backoff(200).as_millis()));
        assert_eq!(RetryPolicy::none().backoff(3), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, 1, 1).max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 1);
    }
}
