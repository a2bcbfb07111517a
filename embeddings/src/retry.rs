//! Retry policy for embedding service calls.
//!
//! Transient failures are retried with exponential backoff and randomized
//! jitter. The policy is owned by the provider, so callers only ever see an
//! error after the retry budget is spent.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{EmbeddingError, Result};

/// Exponential backoff with randomized jitter.
///
/// Each delay is drawn uniformly from `[initial_delay, cap]` where the cap
/// doubles per attempt (multiplier configurable) up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Lower bound for every delay.
    pub initial_delay: Duration,

    /// Upper bound for every delay.
    pub max_delay: Duration,

    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Growth factor for the delay cap.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(40),
            max_attempts: 10,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay before retry number `attempt` (1-indexed: the delay after the
    /// first failed try is `delay_for(1)`).
    ///
    /// `hint` is a server-suggested wait (e.g. `retry-after`); it raises the
    /// lower bound but never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let cap = self.initial_delay.as_millis() as f64
            * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let cap = (cap.min(self.max_delay.as_millis() as f64)) as u64;

        let floor = hint
            .unwrap_or(self.initial_delay)
            .clamp(self.initial_delay, self.max_delay)
            .as_millis() as u64;
        let cap = cap.max(floor);

        let jittered = if cap > floor {
            rand::rng().random_range(floor..=cap)
        } else {
            cap
        };
        Duration::from_millis(jittered)
    }
}

/// Drive `operation` until it succeeds, fails with a non-transient error, or
/// the attempt budget is spent. Exhaustion is reported as
/// [`EmbeddingError::RetriesExhausted`] wrapping the last transient error.
pub async fn retry_async<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= policy.max_attempts => {
                return Err(EmbeddingError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
            Err(err) => {
                let delay = policy.delay_for(attempt, err.retry_after());
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient embedding failure, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=12 {
            let delay = policy.delay_for(attempt, None);
            assert!(delay >= policy.initial_delay, "attempt {attempt}: {delay:?}");
            assert!(delay <= policy.max_delay, "attempt {attempt}: {delay:?}");
        }
    }

    #[test]
    fn delay_honors_server_hint_up_to_cap() {
        let policy = RetryPolicy::default();
        let delay = policy.delay_for(1, Some(Duration::from_secs(30)));
        assert!(delay >= Duration::from_secs(30));
        assert!(delay <= Duration::from_secs(40));

        // A hint beyond the cap is clamped, never honored verbatim.
        let delay = policy.delay_for(1, Some(Duration::from_secs(300)));
        assert!(delay <= Duration::from_secs(40));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2));
        let calls = AtomicU32::new(0);

        let result = retry_async(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(EmbeddingError::Transient("boom".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_last_error() {
        let policy = RetryPolicy::default()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2));
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_async(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EmbeddingError::Transient("still down".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(EmbeddingError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_transient_errors_fail_fast() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_async(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EmbeddingError::ApiRequest("bad request".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(EmbeddingError::ApiRequest(_))));
    }
}
