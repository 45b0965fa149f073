//! The remote operations the ranking engine depends on.
//!
//! The engine only talks to this trait. [`crate::github::GitHubClient`] is
//! the production implementation; tests substitute scripted sources.

use async_trait::async_trait;

use crate::github::{GitHubError, Issue, Review, SearchQuery};

/// Page size used for every paginated call (the platform maximum).
pub const PER_PAGE: u32 = 100;

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct IssuePage {
    /// Issues on this page, in server order.
    pub items: Vec<Issue>,
    /// The next page number, `None` on the last page.
    pub next_page: Option<u32>,
    /// The last page number, when the server reports it.
    pub last_page: Option<u32>,
    /// Total matches for the query, when the server reports it.
    pub total_count: Option<u64>,
}

/// Remote source of pull requests and their reviews.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch one page of a pull request search.
    async fn search_issues(
        &self,
        query: &SearchQuery,
        page: u32,
        per_page: u32,
    ) -> Result<IssuePage, GitHubError>;

    /// List reviews of a pull request (a single page).
    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        per_page: u32,
    ) -> Result<Vec<Review>, GitHubError>;

    /// Prefix stripped from an issue's `repository_url` to get the repo name.
    fn repository_prefix(&self, org: &str) -> String {
        format!("https://api.github.com/repos/{org}/")
    }
}
