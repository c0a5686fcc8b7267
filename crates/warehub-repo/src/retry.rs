//! Retry with exponential backoff for rate-limited requests

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Backoff policy applied to retryable errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Add up to 50% random jitter
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay after failed attempt number `attempt` (1-based).
    ///
    /// `retry_after` is the server's requested wait; the longer of it and
    /// the computed backoff is used, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let mut delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        if self.jitter && !delay.is_zero() {
            let max_jitter = delay.as_millis() as u64 / 2;
            let jitter = rand::rng().random_range(0..=max_jitter);
            delay = delay.saturating_add(Duration::from_millis(jitter));
        }

        if let Some(seconds) = retry_after {
            delay = delay.max(Duration::from_secs(seconds));
        }

        delay.min(self.max_delay)
    }

    /// Run `operation`, retrying retryable failures until `max_attempts`
    /// is reached
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt, err.retry_after());
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "{}, backing off",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
