//! GitHub API client for pull request search and review listing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::{GitHubError, classify_response};
use super::query::SearchQuery;
use super::types::{GitHubRateLimitResponse, Review, SearchIssuesResponse};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::rate_limit::ApiRateLimiter;
use crate::source::{IssuePage, PullRequestSource};

/// Default REST endpoint for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pagination information extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The last page number (from rel="last" link).
    pub last_page: Option<u32>,
    /// The next page number (from rel="next" link).
    pub next_page: Option<u32>,
}

/// Parse the Link header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/search/issues?q=org%3Aacme&per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let part = part.trim();

        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel)
            && let Some(page_num) = extract_page_from_url(url)
        {
            match rel_type {
                "last" => info.last_page = Some(page_num),
                "next" => info.next_page = Some(page_num),
                _ => {}
            }
        }
    }

    info
}

/// Extract the page parameter from a URL.
fn extract_page_from_url(url: &str) -> Option<u32> {
    let query_start = url.find('?')?;
    let query = &url[query_start + 1..];

    for param in query.split('&') {
        if let Some(value) = param.strip_prefix("page=") {
            return value.parse().ok();
        }
    }

    None
}

/// GitHub REST client.
///
/// All requests go through an [`HttpTransport`], so the client can be driven
/// by an in-memory transport in tests.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    token: Arc<String>,
    api_url: String,
    /// Paces search requests only.
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitHubClient {
    /// Create a client backed by reqwest.
    pub fn new(
        token: &str,
        api_url: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, GitHubError> {
        Self::with_transport(Arc::new(ReqwestTransport::default()), token, api_url)
            .map(|client| client.with_rate_limiter(rate_limiter))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        token: &str,
        api_url: &str,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.trim_end_matches('/').to_string();
        Url::parse(&api_url)
            .map_err(|e| GitHubError::Validation(format!("invalid API URL '{api_url}': {e}")))?;

        if token.is_empty() {
            tracing::warn!("No GitHub token configured; requests will be unauthenticated");
        }

        Ok(Self {
            transport,
            token: Arc::new(token.to_string()),
            api_url,
            rate_limiter: None,
        })
    }

    /// Attach (or remove) a proactive rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Option<ApiRateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// The REST endpoint this client talks to, without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build the search URL for one page of `query`.
    pub fn search_url(&self, query: &SearchQuery, page: u32, per_page: u32) -> String {
        let base = format!("{}/search/issues", self.api_url);
        let query = query.to_string();
        let page = page.to_string();
        let per_page = per_page.to_string();
        Url::parse_with_params(
            &base,
            [
                ("q", query.as_str()),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ],
        )
        .map(String::from)
        .unwrap_or(base)
    }

    /// Build the review listing URL for a pull request.
    pub fn reviews_url(&self, owner: &str, repo: &str, number: u64, per_page: u32) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/reviews?per_page={}",
            self.api_url, owner, repo, number, per_page
        )
    }

    fn request(&self, url: String) -> HttpRequest {
        let mut headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            ("User-Agent".to_string(), "rankings".to_string()),
            ("X-GitHub-Api-Version".to_string(), "2022-11-28".to_string()),
        ];
        if !self.token.is_empty() {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", self.token.as_str()),
            ));
        }
        HttpRequest { url, headers }
    }

    /// Perform a GET and decode a JSON body, classifying any failure.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        resource: &str,
    ) -> Result<(T, HttpResponse), GitHubError> {
        let response = self.transport.send(self.request(url)).await?;
        if !response.is_success() {
            return Err(classify_response(&response, resource));
        }

        let data: T = serde_json::from_slice(&response.body)
            .map_err(|e| GitHubError::Decode(format!("{resource}: {e}")))?;
        Ok((data, response))
    }

    /// Get the core and search rate limit status.
    pub async fn get_rate_limits(&self) -> Result<GitHubRateLimitResponse, GitHubError> {
        let url = format!("{}/rate_limit", self.api_url);
        let (limits, _) = self.get_json(url, "rate_limit").await?;
        Ok(limits)
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn search_issues(
        &self,
        query: &SearchQuery,
        page: u32,
        per_page: u32,
    ) -> Result<IssuePage, GitHubError> {
        // Only search draws on the small search quota; reviews use the core quota.
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let url = self.search_url(query, page, per_page);
        let (body, response): (SearchIssuesResponse, _) =
            self.get_json(url, "search/issues").await?;

        if body.incomplete_results {
            tracing::warn!(query = %query, page, "Search results are incomplete");
        }

        let pagination = response
            .header("link")
            .map(parse_link_header)
            .unwrap_or_default();

        Ok(IssuePage {
            items: body.items,
            next_page: pagination.next_page,
            last_page: pagination.last_page,
            total_count: Some(body.total_count),
        })
    }

    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        per_page: u32,
    ) -> Result<Vec<Review>, GitHubError> {
        let url = self.reviews_url(owner, repo, number, per_page);
        let resource = format!("repos/{owner}/{repo}/pulls/{number}/reviews");
        let (reviews, _) = self.get_json(url, &resource).await?;
        Ok(reviews)
    }

    fn repository_prefix(&self, org: &str) -> String {
        format!("{}/repos/{}/", self.api_url, org)
    }
}
