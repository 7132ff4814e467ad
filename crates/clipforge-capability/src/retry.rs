//! Timeout and retry wrapper for capability calls.
//!
//! Every external call gets a per-attempt deadline and a bounded number of
//! retries with exponential backoff. Exhausting retries surfaces as a
//! permanent failure of the smallest enclosing unit of work.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{CapabilityError, CapabilityResult};

/// Retry behavior for one class of capability call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before retry n is `base_delay * 2^n`
    pub base_delay: Duration,
    /// Per-attempt deadline
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            timeout,
        }
    }

    /// Backoff delay before the given retry attempt (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op` under the policy's deadline, retrying transient failures.
///
/// Permanent errors return immediately; transient ones retry with backoff
/// until the budget runs out, at which point the last error is wrapped in
/// `RetriesExhausted`.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    capability: &str,
    mut op: F,
) -> CapabilityResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CapabilityResult<T>>,
{
    let mut last_err = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.backoff(attempt - 1);
            warn!(
                capability,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying capability call"
            );
            tokio::time::sleep(delay).await;
        }

        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(r) => r,
            Err(_) => Err(CapabilityError::timeout(capability, policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    let source = last_err.unwrap_or_else(|| {
        CapabilityError::unavailable(capability, "no attempt recorded")
    });
    Err(CapabilityError::RetriesExhausted {
        capability: capability.to_string(),
        attempts: policy.max_retries + 1,
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let result: CapabilityResult<u32> =
            call_with_retry(&fast_policy(), "asr", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&fast_policy(), "detect", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CapabilityError::unavailable("detect", "flaky"))
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
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: CapabilityResult<()> = call_with_retry(&fast_policy(), "asr", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CapabilityError::invalid_input("asr", "empty audio")) }
        })
        .await;
        assert!(matches!(result, Err(CapabilityError::InvalidInput { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_wraps_last_error() {
        let result: CapabilityResult<()> = call_with_retry(&fast_policy(), "render", || async {
            Err(CapabilityError::unavailable("render", "down"))
        })
        .await;
        match result {
            Err(CapabilityError::RetriesExhausted {
                attempts, source, ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(source.is_retryable());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: CapabilityResult<()> = call_with_retry(&policy, "asr", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(CapabilityError::RetriesExhausted { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }
}
