//! Folding search results into per-author counts and related repositories.

use std::collections::{BTreeSet, HashMap};

use crate::github::{GitHubError, Issue};
use crate::progress::{ProgressCallback, RankingProgress, emit};
use crate::retry::{RetryPolicy, with_rate_limit_retry};
use crate::source::{PER_PAGE, PullRequestSource};

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub user: String,
    pub count: u64,
}

/// Per-author pull request counts.
///
/// Authors are kept in first-encounter order so that sorting by count keeps
/// ties in that order.
#[derive(Debug, Default, Clone)]
pub struct Ranking {
    entries: Vec<RankEntry>,
    index: HashMap<String, usize>,
}

impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one pull request for `login`.
    pub fn record(&mut self, login: &str) {
        match self.index.get(login) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(login.to_string(), self.entries.len());
                self.entries.push(RankEntry {
                    user: login.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn count(&self, login: &str) -> Option<u64> {
        self.index.get(login).map(|&i| self.entries[i].count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by descending count, ties in first-encounter order.
    pub fn into_sorted(self) -> Vec<RankEntry> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }
}

/// Distinct repositories that received a counted pull request.
#[derive(Debug, Clone)]
pub struct RelatedRepos {
    prefix: String,
    repos: BTreeSet<String>,
}

impl RelatedRepos {
    /// `prefix` is stripped from each repository URL, e.g.
    /// `https://api.github.com/repos/acme/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            repos: BTreeSet::new(),
        }
    }

    /// Record a repository by its API URL.
    ///
    /// URLs outside the prefix are kept whole.
    pub fn insert(&mut self, repository_url: &str) {
        let name = repository_url
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(repository_url);
        self.repos.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.repos.contains(name)
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Repository names in lexicographic order.
    pub fn into_sorted(self) -> Vec<String> {
        self.repos.into_iter().collect()
    }
}

/// Result of aggregating one run's issues.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub ranking: Ranking,
    pub repos: RelatedRepos,
    /// Reviews observed, when review fetching was enabled.
    pub reviews: usize,
}

/// Count authors and collect repositories. Issues without an author are skipped.
pub fn tally(issues: &[Issue], repository_prefix: &str) -> (Ranking, RelatedRepos) {
    let mut ranking = Ranking::new();
    let mut repos = RelatedRepos::new(repository_prefix);

    for issue in issues {
        let Some(author) = issue.author() else {
            continue;
        };
        ranking.record(author);
        repos.insert(&issue.repository_url);
    }

    (ranking, repos)
}

/// Split a repository API URL into `(owner, repo)`.
fn owner_and_repo(repository_url: &str) -> Option<(&str, &str)> {
    let mut segments = repository_url.trim_end_matches('/').rsplitn(3, '/');
    let repo = segments.next().filter(|s| !s.is_empty())?;
    let owner = segments.next().filter(|s| !s.is_empty())?;
    Some((owner, repo))
}

/// Aggregate `issues`, optionally fetching and logging reviews of each
/// countable pull request.
///
/// Reviews never change the ranking or the repository set.
pub async fn aggregate<S>(
    source: &S,
    org: &str,
    issues: &[Issue],
    include_reviews: bool,
    policy: &RetryPolicy,
    on_progress: Option<&ProgressCallback>,
) -> Result<Aggregation, GitHubError>
where
    S: PullRequestSource + ?Sized,
{
    let (ranking, repos) = tally(issues, &source.repository_prefix(org));

    let mut reviews = 0;
    if include_reviews {
        for issue in issues.iter().filter(|i| i.author().is_some()) {
            reviews += log_reviews(source, issue, policy, on_progress).await?;
        }
    }

    emit(
        on_progress,
        RankingProgress::AggregationComplete {
            authors: ranking.len(),
            repos: repos.len(),
            issues: issues.len(),
        },
    );

    Ok(Aggregation {
        ranking,
        repos,
        reviews,
    })
}

async fn log_reviews<S>(
    source: &S,
    issue: &Issue,
    policy: &RetryPolicy,
    on_progress: Option<&ProgressCallback>,
) -> Result<usize, GitHubError>
where
    S: PullRequestSource + ?Sized,
{
    let Some((owner, repo)) = owner_and_repo(&issue.repository_url) else {
        tracing::warn!(
            repository_url = %issue.repository_url,
            "Cannot derive repository from URL; skipping reviews"
        );
        return Ok(0);
    };

    emit(
        on_progress,
        RankingProgress::FetchingReviews {
            repo: repo.to_string(),
            number: issue.number,
        },
    );

    let operation = format!("reviews {owner}/{repo}#{}", issue.number);
    let reviews = with_rate_limit_retry(policy, &operation, on_progress, || {
        source.list_reviews(owner, repo, issue.number, PER_PAGE)
    })
    .await?;

    for reviewer in reviews.iter().filter_map(|r| r.reviewer()) {
        tracing::debug!(repo, number = issue.number, reviewer, "Pull request reviewed");
        emit(
            on_progress,
            RankingProgress::ReviewedBy {
                repo: repo.to_string(),
                number: issue.number,
                reviewer: reviewer.to_string(),
            },
        );
    }

    Ok(reviews.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::github::{Actor, Review, SearchQuery};
    use crate::source::IssuePage;

    const PREFIX: &str = "https://api.github.com/repos/acme/";

    fn issue(number: u64, login: Option<&str>, repo: &str) -> Issue {
        Issue {
            number,
            user: Some(Actor {
                login: login.map(String::from),
            }),
            repository_url: format!("{PREFIX}{repo}"),
        }
    }

    /// Answers review listings from a fixed map and records the calls.
    #[derive(Default)]
    struct ReviewSource {
        reviewers: Vec<(u64, Vec<&'static str>)>,
        calls: Mutex<Vec<(String, String, u64)>>,
        fail_with: Mutex<Option<GitHubError>>,
    }

    #[async_trait]
    impl PullRequestSource for ReviewSource {
        async fn search_issues(
            &self,
            _query: &SearchQuery,
            _page: u32,
            _per_page: u32,
        ) -> Result<IssuePage, GitHubError> {
            unreachable!("aggregation never searches")
        }

        async fn list_reviews(
            &self,
            owner: &str,
            repo: &str,
            number: u64,
            _per_page: u32,
        ) -> Result<Vec<Review>, GitHubError> {
            self.calls
                .lock()
                .unwrap()
                .push((owner.to_string(), repo.to_string(), number));
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            let logins = self
                .reviewers
                .iter()
                .find(|(n, _)| *n == number)
                .map(|(_, l)| l.clone())
                .unwrap_or_default();
            Ok(logins
                .into_iter()
                .enumerate()
                .map(|(i, login)| Review {
                    id: Some(i as u64),
                    user: Some(Actor {
                        login: Some(login.to_string()),
                    }),
                    state: Some("APPROVED".to_string()),
                })
                .collect())
        }
    }

    #[test]
    fn test_tally_counts_and_skips_null_authors() {
        let issues = vec![
            issue(1, Some("alice"), "repoA"),
            issue(2, Some("bob"), "repoB"),
            issue(3, Some("alice"), "repoA"),
            issue(4, None, "repoC"),
        ];

        let (ranking, repos) = tally(&issues, PREFIX);

        assert_eq!(ranking.count("alice"), Some(2));
        assert_eq!(ranking.count("bob"), Some(1));
        assert_eq!(ranking.len(), 2);
        assert_eq!(repos.into_sorted(), vec!["repoA", "repoB"]);
    }

    #[test]
    fn test_tally_skips_missing_user_object() {
        let mut ghost = issue(1, None, "repoA");
        ghost.user = None;

        let (ranking, repos) = tally(&[ghost], PREFIX);
        assert!(ranking.is_empty());
        assert!(repos.is_empty());
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let mut ranking = Ranking::new();
        for login in ["carol", "dave", "erin", "dave", "carol", "frank"] {
            ranking.record(login);
        }

        let sorted = ranking.into_sorted();
        let order: Vec<(&str, u64)> = sorted.iter().map(|e| (e.user.as_str(), e.count)).collect();
        assert_eq!(
            order,
            vec![("carol", 2), ("dave", 2), ("erin", 1), ("frank", 1)]
        );
    }

    #[test]
    fn test_related_repos_keeps_foreign_urls_whole() {
        let mut repos = RelatedRepos::new(PREFIX);
        repos.insert("https://api.github.com/repos/acme/widgets");
        repos.insert("https://api.github.com/repos/other/gadgets");
        repos.insert("https://api.github.com/repos/acme/widgets");

        assert_eq!(repos.len(), 2);
        assert!(repos.contains("widgets"));
        assert!(repos.contains("https://api.github.com/repos/other/gadgets"));
    }

    #[test]
    fn test_owner_and_repo() {
        assert_eq!(
            owner_and_repo("https://api.github.com/repos/acme/widgets"),
            Some(("acme", "widgets"))
        );
        assert_eq!(
            owner_and_repo("https://api.github.com/repos/acme/widgets/"),
            Some(("acme", "widgets"))
        );
        assert_eq!(owner_and_repo("widgets"), None);
    }

    #[tokio::test]
    async fn test_aggregate_without_reviews_makes_no_calls() {
        let source = ReviewSource::default();
        let issues = vec![issue(1, Some("alice"), "repoA")];

        let result = aggregate(&source, "acme", &issues, false, &RetryPolicy::default(), None)
            .await
            .unwrap();

        assert_eq!(result.ranking.count("alice"), Some(1));
        assert_eq!(result.reviews, 0);
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_fetches_reviews_for_countable_issues_only() {
        let source = ReviewSource {
            reviewers: vec![(1, vec!["carol", "dave"]), (2, vec!["erin"])],
            ..Default::default()
        };
        let issues = vec![
            issue(1, Some("alice"), "repoA"),
            issue(2, Some("bob"), "repoB"),
            issue(3, None, "repoC"),
        ];

        let events = std::sync::Arc::new(Mutex::new(Vec::new()));
        let events_clone = std::sync::Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_clone.lock().unwrap().push(event);
        });

        let result = aggregate(
            &source,
            "acme",
            &issues,
            true,
            &RetryPolicy::default(),
            Some(&callback),
        )
        .await
        .unwrap();

        assert_eq!(result.reviews, 3);
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec![
                ("acme".to_string(), "repoA".to_string(), 1),
                ("acme".to_string(), "repoB".to_string(), 2),
            ]
        );
        // Reviewers never enter the ranking.
        assert_eq!(result.ranking.count("carol"), None);
        assert_eq!(result.ranking.len(), 2);

        let events = events.lock().unwrap();
        let reviewers: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RankingProgress::ReviewedBy { reviewer, .. } => Some(reviewer.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(reviewers, vec!["carol", "dave", "erin"]);
        assert!(matches!(
            events.last(),
            Some(RankingProgress::AggregationComplete {
                authors: 2,
                repos: 2,
                issues: 3,
            })
        ));
    }

    #[tokio::test]
    async fn test_review_errors_propagate() {
        let source = ReviewSource {
            fail_with: Mutex::new(Some(GitHubError::NotFound("reviews".to_string()))),
            ..Default::default()
        };
        let issues = vec![issue(1, Some("alice"), "repoA")];

        let err = aggregate(&source, "acme", &issues, true, &RetryPolicy::default(), None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, GitHubError::NotFound(_)));
    }
}
