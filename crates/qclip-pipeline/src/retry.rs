//! Fixed-delay retry utilities.
//!
//! Directory deletion is the one place the pipeline retries automatically:
//! transient filesystem locks clear within a bounded number of attempts or
//! not at all, so a fixed delay is used rather than exponential backoff.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            operation_name: operation_name.into(),
        }
    }
}

/// Execute an async operation with fixed-delay retries.
///
/// Returns the first success, or the last error once attempts are
/// exhausted.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts => {
                warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, config.max_attempts, config.delay, e
                );
                attempt += 1;
                tokio::time::sleep(config.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
