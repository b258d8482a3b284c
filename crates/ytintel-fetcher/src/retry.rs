//! Retry with exponential back-off and jitter for scraper calls.
//!
//! Actor runs are slow and occasionally flaky; transient failures (network,
//! 429, 5xx) are retried, everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, [`FetchError::RateLimited`],
/// and 5xx responses.
///
/// **Not retriable:** other HTTP statuses, deserialization failures, IO
/// errors, and configuration problems.
pub(crate) fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        FetchError::RateLimited { .. } => true,
        FetchError::UnexpectedStatus { status, .. } => *status >= 500,
        FetchError::Deserialize { .. }
        | FetchError::Io { .. }
        | FetchError::MissingToken
        | FetchError::InvalidBaseUrl { .. } => false,
    }
}

/// Ceiling for any single back-off, including a server-requested one.
const MAX_DELAY_MS: u64 = 60_000;

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// See [`retry_delay`] for the wait between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }
        attempt += 1;
        let delay = retry_delay(&err, attempt, backoff_base_ms, rand::random::<f64>());
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "scraper transient error, retrying after back-off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Wait before retry `attempt` (1-based): `backoff_base_ms × 2^(attempt-1)`
/// with ±25 % jitter (`jitter` in `[0, 1)`), never shorter than a
/// `Retry-After` the scraper sent, capped at 60 s.
fn retry_delay(err: &FetchError, attempt: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (jitter * 0.5 + 0.75)) as u64;

    let floor = match err {
        FetchError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    Duration::from_millis(jittered.max(floor).min(MAX_DELAY_MS))
}
