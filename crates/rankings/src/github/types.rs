//! GitHub API data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account reference embedded in issues and reviews.
///
/// GitHub returns `null` for deleted ("ghost") accounts, so both the object
/// and its login are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub login: Option<String>,
}

/// An issue (or pull request) returned by the search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub user: Option<Actor>,
    /// API URL of the repository, e.g. `https://api.github.com/repos/acme/widgets`.
    pub repository_url: String,
}

impl Issue {
    /// The login of the account that opened the pull request, if known.
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.login.as_deref())
    }
}

/// A pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub user: Option<Actor>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Review {
    pub fn reviewer(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.login.as_deref())
    }
}

/// Body of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssuesResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<Issue>,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: usize,
    /// Requests used in current period.
    pub used: usize,
    /// Remaining requests in current period.
    pub remaining: usize,
    /// Unix timestamp when the rate limit resets.
    pub reset: u64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset as i64, 0).unwrap_or_else(Utc::now)
    }
}

/// The rate limit resources this tool draws from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRateLimits {
    /// Core API rate limit (used by the review listing).
    pub core: RateLimitResource,
    /// Search API rate limit (used by the pull request search).
    pub search: RateLimitResource,
}

/// Full rate limit response from GitHub's API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub resources: GitHubRateLimits,
}
