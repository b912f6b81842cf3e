use crate::error::ProviderError;
use log::debug;
use std::{future::Future, time::Duration};

/// How hard to try a single provider before recording it as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first.
    pub retries: u32,

    /// Backoff unit; the wait after failed attempt `n` is
    /// `base_delay * n²`.
    pub base_delay: Duration,

    /// Deadline for each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(7),
        }
    }
}

impl RetryPolicy {
    /// Policy that tries exactly once.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
            timeout,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_mul(attempt))
    }

    /// Runs `op` until it succeeds or the attempts run out, returning
    /// the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let err = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.timeout),
            };
            if attempt >= attempts {
                return Err(err);
            }
            let delay = self.delay(attempt);
            debug!("{label}; attempt {attempt}/{attempts} failed: {err}, retrying in {delay:?}");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use crate::error::ProviderError;
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    #[test]
    fn test_quadratic_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
        assert_eq!(policy.delay(3), Duration::from_millis(1800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_retries() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = RetryPolicy::default()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Http("boom".into())) }
            })
            .await;
        assert_eq!(result, Err(ProviderError::Http("boom".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 200 ms after the first failure, 800 ms after the second.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_retry() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ProviderError::Http("flaky".into()))
                    } else {
                        Ok(42.0)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(42.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_each_attempt() {
        let policy = RetryPolicy::no_retry(Duration::from_secs(7));
        let result: Result<(), _> = policy
            .run("test", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(ProviderError::Timeout(Duration::from_secs(7))));
    }
}
