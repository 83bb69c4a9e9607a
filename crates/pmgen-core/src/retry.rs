//! Bounded retry with exponential backoff and jitter.
//!
//! Only errors the caller marks retryable are retried; everything else
//! (bad intake, missing credential) fails fast on the first attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Retry policy: attempt count and backoff shape.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
    /// Growth factor applied to the delay after each attempt.
    pub multiplier: f64,
    /// Random jitter fraction applied to each delay, in `[0.0, 1.0]`.
    /// A value of 0.2 means the delay varies by up to +/-20%.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    /// A config with no sleeping between attempts, for tests.
    pub fn instant() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
            ..Self::default()
        }
    }

    /// A config that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::instant()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        if self.jitter <= 0.0 || capped <= 0.0 {
            return Duration::from_secs_f64(capped);
        }
        let factor = 1.0 + rand::rng().random_range(-self.jitter..=self.jitter);
        Duration::from_secs_f64((capped * factor).max(0.0))
    }
}

/// Run `operation` up to `config.max_attempts` times, sleeping with
/// exponential backoff between attempts. An error for which `is_retryable`
/// returns false is returned immediately.
pub async fn retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= attempts || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = config.delay_for(attempt - 1);
                warn!(
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
