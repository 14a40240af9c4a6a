//! Bounded retry with exponential backoff for idempotent requests

use crate::config::ClientConfig;
use crate::core::error::{RevOpsError, RevOpsResult};
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Sleep before the first retry; doubled for each further retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries, config.retry_backoff())
    }

    /// Sleep before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(6);
        self.base_backoff
            .saturating_mul(1 << exp)
            .min(MAX_BACKOFF)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent
    ///
    /// Only transport timeouts, connection failures and 5xx answers are
    /// retried.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> RevOpsResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RevOpsResult<T>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries && is_retryable(&e) => {
                    retry += 1;
                    let backoff = self.backoff_for(retry);
                    tracing::warn!(
                        request = label,
                        retry,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "retrying request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_retryable(error: &RevOpsError) -> bool {
    match error {
        RevOpsError::Transport(e) => e.is_retryable(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TransportError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> RevOpsError {
        RevOpsError::Transport(TransportError::Status {
            url: "/api/accounts".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        })
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(200));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(800));
        assert_eq!(policy.backoff_for(10), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let result = policy
            .run("accounts", || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(unavailable())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(1, Duration::from_millis(10));

        let result: RevOpsResult<()> = policy
            .run("accounts", || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(unavailable())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: RevOpsResult<()> = RetryPolicy::default()
            .run("accounts", || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(RevOpsError::Transport(TransportError::Status {
                        url: "/api/accounts".to_string(),
                        status: 400,
                        message: "bad filter".to_string(),
                    }))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
