//! Search query construction for `GET /search/issues`.

use std::fmt;

/// A pull request search scoped to one organization.
///
/// Renders to GitHub's search syntax, e.g.
/// `NOT Snyk is:pr archived:false org:acme created:2024-03-01 author:alice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    org: String,
    created: Option<String>,
    author: Option<String>,
    exclude: Option<String>,
}

impl SearchQuery {
    /// All pull requests in non-archived repositories of `org`.
    pub fn pull_requests(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            created: None,
            author: None,
            exclude: None,
        }
    }

    /// Restrict to pull requests created on a single day (`YYYY-MM-DD`).
    #[must_use]
    pub fn created_on(mut self, day: impl Into<String>) -> Self {
        self.created = Some(day.into());
        self
    }

    /// Restrict to pull requests opened by `login`.
    #[must_use]
    pub fn authored_by(mut self, login: Option<&str>) -> Self {
        self.author = login.filter(|l| !l.is_empty()).map(String::from);
        self
    }

    /// Negate a search term, used to drop bot-generated pull requests.
    #[must_use]
    pub fn excluding(mut self, term: Option<&str>) -> Self {
        self.exclude = term.filter(|t| !t.is_empty()).map(String::from);
        self
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(term) = &self.exclude {
            write!(f, "NOT {term} ")?;
        }
        write!(f, "is:pr archived:false org:{}", self.org)?;
        if let Some(day) = &self.created {
            write!(f, " created:{day}")?;
        }
        if let Some(login) = &self.author {
            write!(f, " author:{login}")?;
        }
        Ok(())
    }
}
