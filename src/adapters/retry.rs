//! Retry with exponential backoff for HTTP adapters

use crate::config::RetryConfig;
use crate::domain::errors::{FerryError, SinkError, SourceError};
use crate::domain::Result;
use std::future::Future;
use std::time::Duration;

/// Whether a failed call is worth repeating
///
/// Connection drops, timeouts and 5xx answers are; authentication failures,
/// RPC errors and 4xx answers are not.
pub fn is_transient(error: &FerryError) -> bool {
    match error {
        FerryError::Connection(_) => true,
        FerryError::Source(e) => matches!(
            e,
            SourceError::ConnectionFailed(_)
                | SourceError::Timeout(_)
                | SourceError::ServerError { .. }
        ),
        FerryError::Sink(e) => matches!(
            e,
            SinkError::ConnectionFailed(_) | SinkError::Timeout(_) | SinkError::ServerError { .. }
        ),
        _ => false,
    }
}

/// Backoff before retry number `attempt` (1-based)
pub fn backoff_delay(retry: &RetryConfig, attempt: usize) -> Duration {
    let factor = retry
        .backoff_multiplier
        .powi(attempt.saturating_sub(1) as i32);
    let delay_ms = (retry.initial_delay_ms as f64 * factor) as u64;
    Duration::from_millis(delay_ms.min(retry.max_delay_ms))
}

/// Retry a request with exponential backoff
///
/// The operation runs once plus up to `retry.max_retries` more times while it
/// fails with a transient error.
pub async fn retry_request<F, T, Fut>(retry: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt > retry.max_retries || !is_transient(&e) {
                    return Err(e);
                }

                let delay = backoff_delay(retry, attempt);
                crate::log_retry_attempt!(attempt, retry.max_retries, e);
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Backing off");

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let retry = RetryConfig::default();
        assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&retry, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&retry, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(&retry, 10), Duration::from_millis(30000));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = AtomicUsize::new(0);
        let result = retry_request(&fast_retry(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FerryError::from(SourceError::Timeout("slow".to_string())))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_request(&fast_retry(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FerryError::from(SinkError::ServerError {
                status: 503,
                message: "unavailable".to_string(),
            }))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_request(&fast_retry(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FerryError::from(SourceError::AuthenticationFailed(
                "bad password".to_string(),
            )))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
