//! Progress reporting types for ranking runs.
//!
//! The engine emits these events through an optional callback so the CLI can
//! render them as log lines or a spinner without the library knowing which.

use std::time::Duration;

/// Which rate limit a backoff is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Quota for the current window is spent.
    Primary,
    /// Abuse detection penalty.
    Secondary,
}

impl std::fmt::Display for RateLimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// Progress events emitted during a ranking run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RankingProgress {
    /// Starting the search for one day of the range.
    QueryingDay {
        /// The day, formatted `YYYY-MM-DD`.
        day: String,
    },

    /// A day was already processed in this run and is skipped.
    SkippedDay { day: String },

    /// Starting to page through a search query.
    FetchingPages {
        /// The rendered search query.
        query: String,
    },

    /// Fetched one page of search results.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Number of issues on this page.
        count: usize,
        /// Running total of issues for this query.
        total_so_far: usize,
        /// Last page number, if the server reported one.
        last_page: Option<u32>,
    },

    /// Finished paging through a query.
    FetchComplete {
        /// Total number of issues the query returned.
        total: usize,
    },

    /// Sleeping before retrying a rate-limited request.
    RateLimitBackoff {
        kind: RateLimitKind,
        /// What was being requested.
        operation: String,
        retry_after: Duration,
        /// The attempt that was rate limited (1-indexed).
        attempt: u32,
    },

    /// Fetching reviews of a pull request.
    FetchingReviews { repo: String, number: u64 },

    /// A review was observed.
    ReviewedBy {
        repo: String,
        number: u64,
        reviewer: String,
    },

    /// Aggregation finished.
    AggregationComplete {
        /// Number of distinct authors ranked.
        authors: usize,
        /// Number of distinct related repositories.
        repos: usize,
        /// Number of issues retrieved, countable or not.
        issues: usize,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(RankingProgress) + Send + Sync>;

/// Helper to emit progress events.
///
/// Does nothing when no callback is registered.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: RankingProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
