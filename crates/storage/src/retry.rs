//! Retry policy and backoff calculations for storage calls

use std::future::Future;
use std::time::Duration;
use tagsweep_errors::{Error, Result};

/// Retry policy for retriable storage failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Exponential growth factor
    pub backoff_multiplier: f64,
    /// Fraction of the delay randomized to spread synchronized retries
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy from config-level knobs, keeping the remaining defaults.
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }
}

/// Calculate exponential backoff delay with jitter
#[must_use]
pub fn calculate_backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base_delay = {
        // Precision loss acceptable for backoff calculations
        #[allow(clippy::cast_precision_loss)]
        {
            policy.initial_delay.as_millis().min(u128::from(u64::MAX)) as f64
        }
    };
    let max_delay = {
        #[allow(clippy::cast_precision_loss)]
        {
            policy.max_delay.as_millis().min(u128::from(u64::MAX)) as f64
        }
    };

    let delay = base_delay
        * policy.backoff_multiplier.powi({
            // Retry attempts are small (< 10), so this cast is safe
            #[allow(clippy::cast_possible_wrap)]
            {
                attempt as i32 - 1
            }
        });
    let delay = delay.min(max_delay);

    // Add jitter
    let jitter = delay * policy.jitter_factor * (rand::random::<f64>() - 0.5);
    let final_delay = {
        // max(0.0) ensures non-negative, round() handles the fractional part
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (delay + jitter).max(0.0).round() as u64
        }
    };

    Duration::from_millis(final_delay)
}

/// Run a storage call, retrying retriable failures with backoff.
///
/// Non-retriable failures and exhaustion of the retry budget return the
/// last error unchanged.
///
/// # Errors
///
/// Returns the final error once retries are exhausted or a non-retriable
/// failure occurs.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retriable = match &err {
                    Error::Storage(storage_err) => storage_err.is_retriable(),
                    _ => false,
                };
                if !retriable || attempt > policy.max_retries {
                    return Err(err);
                }

                let delay = calculate_backoff_delay(policy, attempt);
                tracing::debug!(
                    operation,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "retrying transient storage failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
