//! Timeout + retry-with-backoff wrapper for calls to external services.
//!
//! Every network call in the workspace (embedding, chat, vector store) goes
//! through [`retry_with_backoff`]. Each attempt is bounded by
//! [`RetryPolicy::timeout`]; a failed attempt is retried only when the error
//! reports itself as transient via [`Retryable::is_transient`]. Logical errors
//! (collection already exists, bad request, empty input) fail immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Errors that can be classified for retry purposes.
pub trait Retryable: Sized {
    /// `true` for network-level conditions worth another attempt.
    fn is_transient(&self) -> bool;

    /// Builds the error reported when an attempt exceeds its deadline.
    fn timed_out(after: Duration) -> Self;
}

/// Retry knobs for a single external operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 disables retries).
    pub max_retries: u32,
    /// Sleep before the first retry; doubled on every further retry.
    pub initial_backoff: Duration,
    /// Upper bound for a single backoff sleep.
    pub max_backoff: Duration,
    /// Deadline for one attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Reads `RETRY_MAX` and `RETRY_BACKOFF_MS` through `lookup`; unset or
    /// unparsable values keep the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut policy = Self::default();
        if let Some(n) = lookup("RETRY_MAX").and_then(|v| v.trim().parse::<u32>().ok()) {
            policy.max_retries = n;
        }
        if let Some(ms) = lookup("RETRY_BACKOFF_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            policy.initial_backoff = Duration::from_millis(ms);
        }
        policy
    }

    /// [`RetryPolicy::from_lookup`] over the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same policy with a different per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runs `op` under the policy's timeout, retrying transient failures.
///
/// `op_name` only feeds log lines.
pub async fn retry_with_backoff<T, E, F, Fut>(
    op_name: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0u32;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(res) => res,
            Err(_) => Err(E::timed_out(policy.timeout)),
        };

        match outcome {
            Ok(v) => {
                if retry > 0 {
                    debug!("{op_name}: succeeded after {retry} retries");
                }
                return Ok(v);
            }
            Err(err) if err.is_transient() && retry < policy.max_retries => {
                retry += 1;
                let wait = policy.backoff_for(retry);
                warn!("{op_name}: attempt {retry} failed ({err}); retrying in {wait:?}");
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
        Timeout,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Flaky | TestError::Timeout)
        }
        fn timed_out(_after: Duration) -> Self {
            TestError::Timeout
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let calls = AtomicU32::new(0);
        let res: Result<u32, TestError> = retry_with_backoff("flaky", &fast_policy(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { Err(TestError::Flaky) } else { Ok(n) } }
        })
        .await;
        assert_eq!(res, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn logical_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let res: Result<(), TestError> = retry_with_backoff("fatal", &fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Fatal) }
        })
        .await;
        assert_eq!(res, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_call_times_out() {
        let res: Result<(), TestError> = retry_with_backoff("hung", &fast_policy(0), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(res, Err(TestError::Timeout));
    }

    #[test]
    fn policy_from_lookup() {
        let p = RetryPolicy::from_lookup(|k| match k {
            "RETRY_MAX" => Some("3".into()),
            "RETRY_BACKOFF_MS" => Some("junk".into()),
            _ => None,
        });
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.initial_backoff, RetryPolicy::default().initial_backoff);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(p.backoff_for(1), Duration::from_millis(100));
        assert_eq!(p.backoff_for(2), Duration::from_millis(200));
        assert_eq!(p.backoff_for(3), Duration::from_millis(300));
    }
}
