//! Rankings - pull request counts per contributor for a GitHub organization.
//!
//! The library searches an organization's pull requests (optionally one day
//! at a time over a date range), survives primary and secondary rate limits,
//! and ranks authors by how many pull requests they opened.
//!
//! # Example
//!
//! ```ignore
//! use rankings::{GitHubClient, RankingOptions, RankingQuery, rank_pull_requests};
//!
//! let client = GitHubClient::new(&token, rankings::github::DEFAULT_API_URL, None)?;
//! let query = RankingQuery::new("acme", None, Some("2024-03-01..2024-03-31"), false)?;
//! let report = rank_pull_requests(&client, &query, &RankingOptions::default(), None).await?;
//!
//! println!("{}", report.markdown_table());
//! ```

pub mod github;
pub mod http;
pub mod progress;
pub mod rate_limit;
pub mod ranking;
pub mod report;
pub mod retry;
pub mod source;

pub use github::{GitHubClient, GitHubError};
pub use progress::{ProgressCallback, RankingProgress, RateLimitKind};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use ranking::{
    DateRange, RankEntry, RankingError, RankingOptions, RankingQuery, RankingReport,
    rank_pull_requests,
};
pub use retry::RetryPolicy;
pub use source::{IssuePage, PullRequestSource};
