//! Caller-side retry for whole fetches
//!
//! Pagination never retries a page on its own; callers that want resilience wrap
//! the complete operation here and get exponential backoff between attempts.

use crate::config::RetryConfig;
use crate::errors::{AppError, AppResult, SourceError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Calculate next backoff duration using exponential backoff with a maximum cap
///
/// `new_backoff = min(current_backoff * multiplier, max_backoff)`
///
/// # Example
/// ```
/// use std::time::Duration;
/// use scout_analytics::source::calculate_next_backoff;
///
/// let backoff = Duration::from_millis(100);
/// let next = calculate_next_backoff(backoff, 2.0, 30);
/// assert_eq!(next, Duration::from_millis(200));
/// ```
pub fn calculate_next_backoff(
    current_backoff: Duration,
    multiplier: f64,
    max_backoff_seconds: u64,
) -> Duration {
    Duration::from_millis((current_backoff.as_millis() as f64 * multiplier) as u64)
        .min(Duration::from_secs(max_backoff_seconds))
}

/// Whether another attempt could succeed
pub fn is_retryable(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Source(SourceError::SourceUnavailable { .. })
            | AppError::Source(SourceError::Timeout { .. })
    )
}

/// Run `operation` until it succeeds, fails permanently, or retries run out
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut backoff = Duration::from_millis(config.initial_backoff_ms);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && is_retryable(&e) => {
                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation_name, attempt, config.max_retries, e, backoff
                );
                sleep(backoff).await;
                backoff = calculate_next_backoff(
                    backoff,
                    config.backoff_multiplier,
                    config.max_backoff_seconds,
                );
            }
            Err(e) => return Err(e),
        }
    }
}
