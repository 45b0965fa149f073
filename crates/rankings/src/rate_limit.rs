//! Proactive request pacing.
//!
//! Reactive handling of rate-limit responses lives in [`crate::retry`]. This
//! limiter spaces requests out so that a long date range does not run into
//! the search API quota in the first place.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default pacing values.
pub mod rate_limits {
    /// GitHub search: 30 requests/minute for authenticated users.
    pub const GITHUB_SEARCH_DEFAULT_RPM: u32 = 30;
}

/// A standalone API rate limiter using the governor crate.
///
/// # Example
///
/// ```ignore
/// use rankings::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::per_minute(30);
///
/// // Before each API call:
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
    requests_per_minute: u32,
}

impl ApiRateLimiter {
    /// Create a new rate limiter allowing `requests_per_minute` requests.
    ///
    /// A value of 0 is treated as 1.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(rpm));

        Self {
            inner: Arc::new(rate_limiter),
            requests_per_minute: rpm.get(),
        }
    }

    /// The configured quota.
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter")
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}
