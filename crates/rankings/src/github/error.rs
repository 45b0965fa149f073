//! GitHub API error types.
//!
//! Every failed call is classified exactly once, when the response is
//! received, into one of these variants. Callers dispatch on the variant
//! instead of re-inspecting status codes or headers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Primary rate limit: the quota for the current window is spent.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Secondary (abuse detection) rate limit.
    #[error("Secondary rate limit exceeded{}", retry_after_suffix(.retry_after))]
    SecondaryRateLimited { retry_after: Option<Duration> },

    #[error("Authentication required")]
    AuthRequired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the request, usually a malformed search query.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} rate-limited attempts ({waited:?} spent waiting)")]
    RetriesExhausted { attempts: u32, waited: Duration },
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(" (retry after {}s)", d.as_secs()))
        .unwrap_or_default()
}

impl GitHubError {
    /// Check if this error is one of the two retryable rate-limit shapes.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::SecondaryRateLimited { .. }
        )
    }
}

impl From<HttpError> for GitHubError {
    fn from(err: HttpError) -> Self {
        GitHubError::Network(err.to_string())
    }
}

/// Error body returned by the GitHub REST API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    documentation_url: Option<String>,
}

impl ApiErrorBody {
    fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| Self {
            message: String::from_utf8_lossy(body).trim().to_string(),
            documentation_url: None,
        })
    }

    fn mentions_secondary_limit(&self) -> bool {
        let message = self.message.to_lowercase();
        let docs = self
            .documentation_url
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        message.contains("secondary rate limit")
            || message.contains("abuse")
            || docs.contains("secondary-rate-limits")
            || docs.contains("abuse-rate-limits")
    }
}

/// Classify a non-success response into a [`GitHubError`].
///
/// `resource` names what was requested and is used for not-found messages.
pub fn classify_response(response: &HttpResponse, resource: &str) -> GitHubError {
    let body = ApiErrorBody::parse(&response.body);

    match response.status {
        401 => GitHubError::AuthRequired,
        403 | 429 => {
            if response.header("x-ratelimit-remaining") == Some("0") {
                let reset_at = response
                    .header("x-ratelimit-reset")
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                    .unwrap_or_else(Utc::now);
                return GitHubError::RateLimited { reset_at };
            }

            let retry_after = response
                .header("retry-after")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);

            if retry_after.is_some() || body.mentions_secondary_limit() || response.status == 429
            {
                GitHubError::SecondaryRateLimited { retry_after }
            } else {
                GitHubError::Forbidden(body.message)
            }
        }
        404 => GitHubError::NotFound(resource.to_string()),
        422 => GitHubError::Validation(body.message),
        status => GitHubError::Api {
            status,
            message: body.message,
        },
    }
}
