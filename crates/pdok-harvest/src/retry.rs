//! Exponential backoff for catalog requests.
//!
//! Only the metadata catalog is retried. Capabilities endpoints get exactly
//! one attempt each.

use std::future::Future;
use std::time::Duration;

use crate::error::HarvestError;

/// Network failures, 429 and 5xx. Malformed documents, exception reports and
/// other 4xx answers would come back the same on a second try.
fn is_transient(err: &HarvestError) -> bool {
    match err {
        HarvestError::Http(_) => true,
        HarvestError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Delay before retry number `retry` (0-based): `base * 2^retry` seconds.
fn backoff_delay(backoff_base_secs: u64, retry: u32) -> Duration {
    let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
    Duration::from_secs(backoff_base_secs.saturating_mul(factor))
}

/// Runs `request` once, then up to `max_retries` more times while it fails
/// with a transient error. The last error is returned when retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut request: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HarvestError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match request().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < max_retries && is_transient(&err) => err,
            Err(err) => return Err(err),
        };

        let delay = backoff_delay(backoff_base_secs, retry);
        tracing::warn!(
            retry = retry + 1,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %err,
            "catalog request failed; retrying"
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status(status: u16) -> HarvestError {
        HarvestError::UnexpectedStatus {
            status,
            url: "https://csw.example.com/csw".to_owned(),
        }
    }

    /// Runs `retry_with_backoff` over a scripted sequence of outcomes and
    /// returns the result with the number of attempts made.
    async fn run_script(
        max_retries: u32,
        script: Vec<Result<u32, HarvestError>>,
    ) -> (Result<u32, HarvestError>, u32) {
        let attempts = AtomicU32::new(0);
        let script = std::sync::Mutex::new(script.into_iter());
        let result = retry_with_backoff(max_retries, 0, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            let next = script.lock().unwrap().next().expect("script exhausted");
            async move { next }
        })
        .await;
        (result, attempts.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let (result, attempts) = run_script(3, vec![Ok(42)]).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let script = vec![Err(status(503)), Err(status(502)), Ok(7)];
        let (result, attempts) = run_script(3, script).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let script = vec![Err(status(500)), Err(status(500)), Err(status(429))];
        let (result, attempts) = run_script(2, script).await;
        assert_eq!(attempts, 3);
        assert!(matches!(
            result,
            Err(HarvestError::UnexpectedStatus { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn client_errors_and_exceptions_fail_fast() {
        let (result, attempts) = run_script(3, vec![Err(status(404))]).await;
        assert_eq!(attempts, 1);
        assert!(result.is_err());

        let exception = HarvestError::ServiceException {
            context: "csw".to_owned(),
            message: "invalid constraint".to_owned(),
        };
        let (result, attempts) = run_script(3, vec![Err(exception)]).await;
        assert_eq!(attempts, 1);
        assert!(matches!(result, Err(HarvestError::ServiceException { .. })));
    }

    #[test]
    fn delay_doubles_and_saturates() {
        assert_eq!(backoff_delay(1, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, 3), Duration::from_secs(16));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
        assert_eq!(backoff_delay(3, 200), Duration::from_secs(u64::MAX));
    }
}
