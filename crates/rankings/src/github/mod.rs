//! GitHub API client for pull request rankings.
//!
//! # Module Structure
//!
//! - [`error`] - Tagged error type and response classification
//! - [`types`] - Response data structures
//! - [`query`] - Search query construction
//! - [`client`] - Client, Link header parsing, rate limit status

mod client;
mod error;
mod query;
mod types;

pub use client::{DEFAULT_API_URL, GitHubClient, LinkPagination, parse_link_header};
pub use error::{GitHubError, classify_response};
pub use query::SearchQuery;
pub use types::{
    Actor, GitHubRateLimitResponse, GitHubRateLimits, Issue, RateLimitResource, Review,
    SearchIssuesResponse,
};
