//! The ranking engine.
//!
//! A run walks the requested days (or a single unscoped query), pages through
//! the search results for each, then folds the issues into a ranking.
//!
//! # Module Structure
//!
//! - [`dates`] - Date range parsing and day iteration
//! - [`pagination`] - Page-by-page collection of one query
//! - [`aggregate`] - Author counts, related repositories, review fan-out
//!
//! # Example
//!
//! ```ignore
//! use rankings::github::GitHubClient;
//! use rankings::ranking::{RankingOptions, RankingQuery, rank_pull_requests};
//!
//! let client = GitHubClient::new(&token, "https://api.github.com", None)?;
//! let query = RankingQuery::new("acme", None, Some("2024-01-01..2024-01-31"), false)?;
//! let report = rank_pull_requests(&client, &query, &RankingOptions::default(), None).await?;
//! println!("{}", report.markdown_table());
//! ```

pub mod aggregate;
pub mod dates;
mod error;
pub mod pagination;

pub use aggregate::{Aggregation, RankEntry, Ranking, RelatedRepos, aggregate, tally};
pub use dates::{DateRange, ProcessedDays, format_day};
pub use error::RankingError;
pub use pagination::fetch_all_pages;

use crate::github::{GitHubError, Issue, SearchQuery};
use crate::progress::{ProgressCallback, RankingProgress, emit};
use crate::report;
use crate::retry::RetryPolicy;
use crate::source::PullRequestSource;

/// Search term negated in every query to drop dependency-bot pull requests.
pub const DEFAULT_EXCLUDED_TERM: &str = "Snyk";

/// What to rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingQuery {
    pub org: String,
    pub author: Option<String>,
    pub date_range: Option<DateRange>,
    pub include_reviews: bool,
}

impl RankingQuery {
    /// Validate inputs before any remote call is made.
    ///
    /// Empty `author` and `date_range` strings are treated as absent.
    pub fn new(
        org: &str,
        author: Option<&str>,
        date_range: Option<&str>,
        include_reviews: bool,
    ) -> Result<Self, RankingError> {
        let org = org.trim();
        if org.is_empty() {
            return Err(RankingError::MissingOrganization);
        }

        let date_range = date_range
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::parse::<DateRange>)
            .transpose()?;

        Ok(Self {
            org: org.to_string(),
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from),
            date_range,
            include_reviews,
        })
    }

    fn base_search(&self, options: &RankingOptions) -> SearchQuery {
        SearchQuery::pull_requests(&self.org)
            .excluding(options.exclude.as_deref())
            .authored_by(self.author.as_deref())
    }
}

/// How to run the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingOptions {
    pub retry: RetryPolicy,
    /// Term negated in every search query; `None` disables the exclusion.
    pub exclude: Option<String>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            exclude: Some(DEFAULT_EXCLUDED_TERM.to_string()),
        }
    }
}

/// The outcome of a ranking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingReport {
    /// Authors by descending count, ties in first-encounter order.
    pub ranking: Vec<RankEntry>,
    /// Related repositories in lexicographic order.
    pub related_repos: Vec<String>,
    /// Issues retrieved, countable or not.
    pub issues: usize,
    /// Days queried. Zero for an unscoped run.
    pub days_queried: usize,
    /// Reviews observed, when review fetching was enabled.
    pub reviews: usize,
}

impl RankingReport {
    /// Two-column markdown table with headers `user` and `count`.
    pub fn markdown_table(&self) -> String {
        report::markdown_table(&self.ranking)
    }

    /// Related repositories joined by newlines.
    pub fn related_repos_list(&self) -> String {
        report::related_repos_list(&self.related_repos)
    }
}

/// Run the search for every unprocessed day in `range`.
///
/// Days already in `processed` are skipped; every other day is recorded
/// before it is queried. Returns the issues in day order.
pub async fn fetch_date_range<S>(
    source: &S,
    base: &SearchQuery,
    range: &DateRange,
    processed: &mut ProcessedDays,
    policy: &RetryPolicy,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<Issue>, GitHubError>
where
    S: PullRequestSource + ?Sized,
{
    let mut issues = Vec::new();

    for day in range.days().map(format_day) {
        if !processed.mark(&day) {
            tracing::debug!(day = %day, "Day already processed; skipping");
            emit(on_progress, RankingProgress::SkippedDay { day });
            continue;
        }

        tracing::debug!(day = %day, "Querying day");
        let query = base.clone().created_on(day.as_str());
        emit(on_progress, RankingProgress::QueryingDay { day });

        let day_issues = fetch_all_pages(source, &query, policy, on_progress).await?;
        issues.extend(day_issues);
    }

    Ok(issues)
}

/// Rank the authors of pull requests matching `query`.
///
/// Any non-rate-limit failure, including one during review fetching, aborts
/// the run without a partial report.
pub async fn rank_pull_requests<S>(
    source: &S,
    query: &RankingQuery,
    options: &RankingOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<RankingReport, RankingError>
where
    S: PullRequestSource + ?Sized,
{
    let base = query.base_search(options);

    let (issues, days_queried) = match &query.date_range {
        Some(range) => {
            let mut processed = ProcessedDays::new();
            let issues = fetch_date_range(
                source,
                &base,
                range,
                &mut processed,
                &options.retry,
                on_progress,
            )
            .await?;
            (issues, processed.len())
        }
        None => (
            fetch_all_pages(source, &base, &options.retry, on_progress).await?,
            0,
        ),
    };

    tracing::info!(
        org = %query.org,
        issues = issues.len(),
        days = days_queried,
        "Finished searching pull requests"
    );

    let aggregation = aggregate(
        source,
        &query.org,
        &issues,
        query.include_reviews,
        &options.retry,
        on_progress,
    )
    .await?;

    Ok(RankingReport {
        ranking: aggregation.ranking.into_sorted(),
        related_repos: aggregation.repos.into_sorted(),
        issues: issues.len(),
        days_queried,
        reviews: aggregation.reviews,
    })
}
