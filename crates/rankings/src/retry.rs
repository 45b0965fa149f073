//! Rate-limit aware request execution.
//!
//! Every remote call the engine makes goes through [`with_rate_limit_retry`].
//! Rate-limited calls are retried after a server-driven wait; every other
//! failure propagates on the first occurrence.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::github::GitHubError;
use crate::progress::{ProgressCallback, RankingProgress, RateLimitKind, emit};

/// Default maximum attempts per request, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default floor for a primary rate-limit wait.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);

/// Default wait after a secondary rate limit.
pub const DEFAULT_SECONDARY_COOLDOWN: Duration = Duration::from_secs(30);

/// Configuration for rate-limit retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per request, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Smallest wait after a primary rate limit.
    pub min_backoff: Duration,
    /// Fixed wait after a secondary rate limit.
    pub secondary_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_backoff: DEFAULT_MIN_BACKOFF,
            secondary_cooldown: DEFAULT_SECONDARY_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, min_backoff: Duration, secondary_cooldown: Duration) -> Self {
        Self {
            max_attempts,
            min_backoff,
            secondary_cooldown,
        }
    }

    /// How long to wait for a primary limit that resets at `reset_at`.
    ///
    /// Never shorter than `min_backoff`, so a reset time already in the past
    /// cannot produce a negative sleep or a tight loop.
    #[must_use]
    pub fn primary_delay(&self, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (reset_at - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(self.min_backoff)
    }

    fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Execute `call` until it succeeds, sleeping through rate limits.
///
/// - Primary limit: wait until the reported reset (floored by the policy).
/// - Secondary limit: wait the policy's cooldown. The server hint is logged only.
/// - Anything else: returned immediately.
///
/// After `max_attempts` rate-limited attempts the result is
/// [`GitHubError::RetriesExhausted`].
///
/// # Example
///
/// ```ignore
/// use rankings::retry::{RetryPolicy, with_rate_limit_retry};
///
/// let page = with_rate_limit_retry(&RetryPolicy::default(), "search page 1", None, || {
///     source.search_issues(&query, 1, PER_PAGE)
/// })
/// .await?;
/// ```
pub async fn with_rate_limit_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    on_progress: Option<&ProgressCallback>,
    mut call: F,
) -> Result<T, GitHubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubError>>,
{
    let max_attempts = policy.attempt_limit();
    let mut attempt: u32 = 0;
    let mut waited = Duration::ZERO;

    loop {
        attempt += 1;

        let (kind, delay) = match call().await {
            Ok(value) => return Ok(value),
            Err(GitHubError::RateLimited { reset_at }) => {
                let delay = policy.primary_delay(reset_at, Utc::now());
                tracing::warn!(
                    operation,
                    attempt,
                    %reset_at,
                    delay_secs = delay.as_secs_f64(),
                    "Primary rate limit hit"
                );
                (RateLimitKind::Primary, delay)
            }
            Err(GitHubError::SecondaryRateLimited { retry_after }) => {
                tracing::warn!(
                    operation,
                    attempt,
                    server_retry_after_secs = retry_after.map(|d| d.as_secs()),
                    delay_secs = policy.secondary_cooldown.as_secs_f64(),
                    "Secondary rate limit hit"
                );
                (RateLimitKind::Secondary, policy.secondary_cooldown)
            }
            Err(err) => return Err(err),
        };

        if attempt >= max_attempts {
            tracing::error!(
                operation,
                attempts = attempt,
                waited_secs = waited.as_secs(),
                "Giving up after repeated rate limits"
            );
            return Err(GitHubError::RetriesExhausted {
                attempts: attempt,
                waited,
            });
        }

        emit(
            on_progress,
            RankingProgress::RateLimitBackoff {
                kind,
                operation: operation.to_string(),
                retry_after: delay,
                attempt,
            },
        );

        tokio::time::sleep(delay).await;
        waited += delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::TimeDelta;
    use tokio::time::Instant;

    /// An operation that fails with the given errors in order, then succeeds.
    fn scripted(
        failures: Vec<GitHubError>,
        calls: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, GitHubError>> {
        let failures = Arc::new(Mutex::new(failures.into_iter()));
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let next = failures.lock().unwrap().next();
            std::future::ready(match next {
                Some(err) => Err(err),
                None => Ok(42),
            })
        }
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.min_backoff, Duration::from_secs(1));
        assert_eq!(policy.secondary_cooldown, Duration::from_secs(30));
    }

    #[test]
    fn test_primary_delay_past_reset_is_floored() {
        let policy = RetryPolicy::default();
        let now = Utc::now();
        let delay = policy.primary_delay(now - TimeDelta::seconds(600), now);
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn test_primary_delay_future_reset() {
        let policy = RetryPolicy::default();
        let now = Utc::now();
        let delay = policy.primary_delay(now + TimeDelta::seconds(90), now);
        assert_eq!(delay, Duration::from_secs(90));
    }

    #[test]
    fn test_primary_delay_respects_custom_floor() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(30));
        let now = Utc::now();
        assert_eq!(
            policy.primary_delay(now + TimeDelta::seconds(2), now),
            Duration::from_secs(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_limit_in_past_retries_after_floor() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = scripted(
            vec![GitHubError::RateLimited {
                reset_at: Utc::now() - TimeDelta::seconds(3600),
            }],
            Arc::clone(&calls),
        );

        let start = Instant::now();
        let result = with_rate_limit_retry(&RetryPolicy::default(), "search", None, op).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_limit_waits_until_reset() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = scripted(
            vec![GitHubError::RateLimited {
                reset_at: Utc::now() + TimeDelta::seconds(120),
            }],
            Arc::clone(&calls),
        );

        let start = Instant::now();
        let result = with_rate_limit_retry(&RetryPolicy::default(), "search", None, op).await;

        assert_eq!(result.unwrap(), 42);
        assert!(start.elapsed() >= Duration::from_secs(119));
    }

    #[tokio::test(start_paused = true)]
    async fn test_secondary_limit_waits_cooldown_and_ignores_hint() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = scripted(
            vec![GitHubError::SecondaryRateLimited {
                retry_after: Some(Duration::from_secs(2)),
            }],
            Arc::clone(&calls),
        );

        let start = Instant::now();
        let result = with_rate_limit_retry(&RetryPolicy::default(), "search", None, op).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_backoff_progress() {
        let events: Arc<Mutex<Vec<RankingProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        let calls = Arc::new(AtomicU32::new(0));
        let op = scripted(
            vec![
                GitHubError::SecondaryRateLimited { retry_after: None },
                GitHubError::RateLimited {
                    reset_at: Utc::now(),
                },
            ],
            Arc::clone(&calls),
        );

        let result =
            with_rate_limit_retry(&RetryPolicy::default(), "reviews", Some(&callback), op).await;
        assert_eq!(result.unwrap(), 42);

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(events.len(), 2);
        match &events[0] {
            RankingProgress::RateLimitBackoff {
                kind,
                operation,
                retry_after,
                attempt,
            } => {
                assert_eq!(*kind, RateLimitKind::Secondary);
                assert_eq!(operation, "reviews");
                assert_eq!(*retry_after, Duration::from_secs(30));
                assert_eq!(*attempt, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            events[1],
            RankingProgress::RateLimitBackoff {
                kind: RateLimitKind::Primary,
                attempt: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_non_rate_limit_errors_are_not_retried() {
        for err in [
            GitHubError::AuthRequired,
            GitHubError::NotFound("repos/acme/gone".to_string()),
            GitHubError::Validation("bad query".to_string()),
            GitHubError::Network("reset".to_string()),
        ] {
            let calls = Arc::new(AtomicU32::new(0));
            let op = scripted(vec![err], Arc::clone(&calls));

            let result = with_rate_limit_retry(&RetryPolicy::default(), "search", None, op).await;

            assert!(result.is_err());
            assert!(!result.unwrap_err().is_rate_limited());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let failures = (0..10)
            .map(|_| GitHubError::SecondaryRateLimited { retry_after: None })
            .collect();
        let op = scripted(failures, Arc::clone(&calls));
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30));

        let err = with_rate_limit_retry(&policy, "search", None, op)
            .await
            .expect_err("should exhaust");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            GitHubError::RetriesExhausted { attempts, waited } => {
                assert_eq!(attempts, 3);
                assert_eq!(waited, Duration::from_secs(60));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = scripted(Vec::new(), Arc::clone(&calls));
        let policy = RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(30));

        let result = with_rate_limit_retry(&policy, "search", None, op).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
