use thiserror::Error;

use crate::github::GitHubError;

/// Errors that end a ranking run.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Organization must not be empty")]
    MissingOrganization,

    /// The date range could not be parsed. Raised before any remote call.
    #[error("Invalid date range '{input}': {reason}")]
    InvalidDateRange { input: String, reason: String },

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

impl RankingError {
    pub(crate) fn invalid_range(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDateRange {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
