//! Shared exponential-backoff retry policy.
//!
//! Every place the pipeline retries an external call — the provider
//! gateway's primary-attempt loop and the image generator's per-image
//! outer loop — runs through the same [`RetryPolicy`] so the backoff
//! behavior is tuned in exactly one place.

use std::future::Future;
use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given 1-based attempt fails.
    ///
    /// `base * multiplier^(attempt-1)`, clamped to
    /// [`RetryPolicy::max_delay`]. Attempt 0 is treated as attempt 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let ms = self.base_delay.as_millis() as f64 * self.multiplier.powi(exp as i32);
        Duration::from_millis(ms as u64).min(self.max_delay)
    }

    /// Run `op` up to [`max_attempts`](Self::max_attempts) times,
    /// sleeping [`delay_for`](Self::delay_for) between failed attempts.
    ///
    /// The closure receives the 1-based attempt number. Returns the first
    /// success, or the error from the final attempt. No sleep happens
    /// after the last attempt.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
            }
        }

        // max_attempts >= 1, so at least one error was recorded.
        Err(last_err.expect("retry loop ran at least once"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn delay_clamps_at_max() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(3),
            ..Default::default()
        };
        assert_eq!(policy.delay_for(10), Duration::from_secs(3));
    }

    #[test]
    fn delay_treats_zero_as_first_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), policy.delay_for(1));
    }

    #[test]
    fn custom_multiplier() {
        let policy = RetryPolicy {
            multiplier: 3.0,
            max_delay: Duration::from_secs(60),
            ..Default::default()
        };
        assert_eq!(policy.delay_for(3), Duration::from_millis(9000));
    }

    #[tokio::test]
    async fn run_returns_first_success() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let result: Result<u32, &str> = policy.run(|attempt| async move { Ok(attempt) }).await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn run_makes_exactly_max_attempts() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("attempt {attempt} failed")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // The surfaced error is from the final attempt.
        assert_eq!(result.unwrap_err(), "attempt 3 failed");
    }

    #[tokio::test]
    async fn run_recovers_after_transient_failures() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = policy
            .run(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
