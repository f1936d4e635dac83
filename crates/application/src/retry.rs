//! Retry loop for steps that failed on the network.

use std::future::Future;

use probe_domain::{RetryPolicy, StepResult};

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
///
/// Only errors for which [`probe_domain::HarnessError::is_retryable`] holds
/// are retried; the last error is returned unchanged.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry_step<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> StepResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StepResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && policy.allows_another(attempt) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "step failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
