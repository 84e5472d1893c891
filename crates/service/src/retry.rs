use std::future::Future;
use std::time::Duration;

use configs::RetryConfig;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::observability::RETRIES_TOTAL;

/// Errors that know whether another attempt could succeed.
pub trait Retryable: std::error::Error {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        ApiError::is_retryable(self)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff_base: Duration,
        backoff_max: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            backoff_max,
            enabled,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.max_attempts, cfg.backoff_base(), cfg.backoff_max(), cfg.enabled)
    }

    /// Single attempt, no backoff.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, false)
    }

    /// Attempts a single call may take, the first included.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts
        } else {
            1
        }
    }

    /// Exponential backoff for retry number `attempt` (1-based), capped at `backoff_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if !self.enabled || attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 1).min(20);
        let backoff_ms = (self.backoff_base.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(backoff_ms.min(self.backoff_max.as_millis() as u64))
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        let backoff_duration = self.backoff(attempt);
        if backoff_duration.is_zero() {
            return;
        }
        debug!("Retrying in {:?} (attempt {})", backoff_duration, attempt);
        sleep(backoff_duration).await;
    }

    /// `attempts_made` counts attempts already finished, the failing one included.
    pub fn should_retry<E: Retryable>(&self, attempts_made: u32, error: &E) -> bool {
        if !self.enabled {
            return false;
        }
        if attempts_made >= self.max_attempts {
            debug!("Max retry attempts ({}) reached", self.max_attempts);
            return false;
        }
        if error.is_retryable() {
            debug!("Error is retryable: {}", error);
            true
        } else {
            debug!("Error is not retryable: {}", error);
            false
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
{
    let mut attempts_made = 0;
    loop {
        if attempts_made > 0 {
            policy.wait_before_retry(attempts_made).await;
            RETRIES_TOTAL.inc();
        }

        match operation().await {
            Ok(result) => {
                if attempts_made > 0 {
                    debug!("Operation succeeded after {} retries", attempts_made);
                }
                return Ok(result);
            }
            Err(error) => {
                attempts_made += 1;
                if policy.should_retry(attempts_made, &error) {
                    warn!("Operation failed on attempt {}: {}", attempts_made, error);
                    continue;
                }
                return Err(error);
            }
        }
    }
}
