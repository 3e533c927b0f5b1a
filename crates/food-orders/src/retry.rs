//! Bounded retry with exponential backoff and jitter.
//!
//! Used twice in the pipeline, with independent policies: once around the worker's
//! conditional update, once around notification publishing.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Retry policy for transient failures.
///
/// `delay = min(initial_delay * multiplier^attempt, max_delay) * jitter`, with jitter drawn
/// from `0.5..=1.0` so that many orders failing together do not retry in lockstep.
///
/// ```rust
/// use food_orders::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(3)
///     .with_initial_delay(Duration::from_millis(50));
/// assert!(policy.delay_for_attempt(0) <= Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Defaults: 5 attempts, 100 ms initial delay, 5 s cap, doubling.
    pub const fn new() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay to wait after the failed attempt number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        // A negative multiplier makes odd powers negative; never wait less than zero
        let capped = base.min(self.max_delay.as_secs_f64()).max(0.0);
        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        Duration::from_secs_f64(capped * jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or the policy is exhausted.
///
/// `retryable` decides which errors are worth another attempt; anything else is returned
/// immediately. The last error is returned once attempts run out.
pub async fn retry<F, Fut, T, E>(
    operation: &str,
    policy: &RetryPolicy,
    retryable: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                attempt += 1;
                if !retryable(&error) || attempt >= policy.max_attempts() {
                    return Err(error);
                }
                let delay = policy.delay_for_attempt(attempt - 1);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
