//! Exponential backoff with jitter for source fetch requests.
//!
//! Transient failures (429, 5xx, connect errors, timeouts) are retried.
//! Everything else, including bot challenges and 404s, is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

const MAX_DELAY_MS: u64 = 30_000;

/// Whether a failed request may succeed if sent again later.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status().is_some_and(|status| status.is_server_error())
        }
        SourceError::Deserialize { .. }
        | SourceError::Xml(_)
        | SourceError::NotFound { .. }
        | SourceError::BotChallenge { .. }
        | SourceError::MissingPayload { .. }
        | SourceError::PlatformMismatch { .. } => false,
    }
}

/// Delay before retry `attempt` (1-based). A server-provided `Retry-After`
/// is honoured as a floor.
fn backoff_delay_ms(attempt: u32, backoff_base_ms: u64, err: &SourceError) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(2u64.pow(exponent))
        .min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let floor = match err {
        SourceError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1_000).min(MAX_DELAY_MS),
        _ => 0,
    };
    jittered.max(floor)
}

/// Drive `operation` until it succeeds, fails permanently, or has been
/// retried `max_retries` times.
///
/// Retry `n` waits `backoff_base_ms * 2^(n-1)`, capped at 30 s and scaled by
/// a random factor in `[0.75, 1.25)`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries < max_retries && is_retriable(&err) => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay_ms = backoff_delay_ms(retries, backoff_base_ms, &err);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms,
            error = %err,
            "transient source error, backing off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn rate_limited() -> SourceError {
        SourceError::RateLimited {
            url: "https://www.reddit.com/comments/abc.json".to_owned(),
            retry_after_secs: 0,
        }
    }

    /// Replays `outcomes` in order and returns the final result with the
    /// number of calls made.
    async fn replay(
        max_retries: u32,
        outcomes: Vec<Result<&'static str, SourceError>>,
    ) -> (Result<&'static str, SourceError>, usize) {
        let queue = Mutex::new(VecDeque::from(outcomes));
        let calls = Mutex::new(0usize);
        let result = retry_with_backoff(max_retries, 0, || {
            *calls.lock().unwrap() += 1;
            let next = queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("operation called more often than scripted");
            async move { next }
        })
        .await;
        let made = *calls.lock().unwrap();
        (result, made)
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        assert!(is_retriable(&SourceError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned()
        }));
        assert!(!is_retriable(&SourceError::UnexpectedStatus {
            status: 403,
            url: "u".to_owned()
        }));
        assert!(!is_retriable(&SourceError::BotChallenge {
            url: "u".to_owned()
        }));
    }

    #[test]
    fn retry_after_sets_a_floor_and_delays_are_capped() {
        let limited = SourceError::RateLimited {
            url: "u".to_owned(),
            retry_after_secs: 7,
        };
        assert!(backoff_delay_ms(1, 10, &limited) >= 7_000);
        let server = SourceError::UnexpectedStatus {
            status: 502,
            url: "u".to_owned(),
        };
        assert!(backoff_delay_ms(20, 10_000, &server) <= MAX_DELAY_MS * 5 / 4);
        let first = backoff_delay_ms(1, 400, &server);
        assert!((300..500).contains(&first));
    }

    #[tokio::test]
    async fn first_success_makes_one_call() {
        let (result, calls) = replay(3, vec![Ok("page")]).await;
        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn rate_limits_are_retried_until_success() {
        let (result, calls) =
            replay(3, vec![Err(rate_limited()), Err(rate_limited()), Ok("page")]).await;
        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn last_error_surfaces_once_retries_run_out() {
        let outcomes = vec![Err(rate_limited()), Err(rate_limited()), Err(rate_limited())];
        let (result, calls) = replay(2, outcomes).await;
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(SourceError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn not_found_is_returned_without_retrying() {
        let missing = SourceError::NotFound {
            url: "https://www.youtube.com/watch?v=x".to_owned(),
        };
        let (result, calls) = replay(3, vec![Err(missing)]).await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }
}
