//! Page-by-page collection of one search query.

use crate::github::{GitHubError, Issue, SearchQuery};
use crate::progress::{ProgressCallback, RankingProgress, emit};
use crate::retry::{RetryPolicy, with_rate_limit_retry};
use crate::source::{PER_PAGE, PullRequestSource};

/// Fetch every page of `query`, starting at page 1.
///
/// Pages are requested in strictly increasing order. A rate-limited page is
/// retried by the executor before anything is appended; any other failure
/// drops the partial results and is returned.
pub async fn fetch_all_pages<S>(
    source: &S,
    query: &SearchQuery,
    policy: &RetryPolicy,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<Issue>, GitHubError>
where
    S: PullRequestSource + ?Sized,
{
    emit(
        on_progress,
        RankingProgress::FetchingPages {
            query: query.to_string(),
        },
    );
    tracing::debug!(query = %query, "Searching pull requests");

    let mut issues = Vec::new();
    let mut page = 1u32;

    loop {
        let operation = format!("search page {page}");
        let result = with_rate_limit_retry(policy, &operation, on_progress, || {
            source.search_issues(query, page, PER_PAGE)
        })
        .await?;

        let count = result.items.len();
        issues.extend(result.items);

        tracing::debug!(
            page,
            count,
            total_so_far = issues.len(),
            next_page = result.next_page,
            total_count = result.total_count,
            "Fetched search page"
        );
        emit(
            on_progress,
            RankingProgress::FetchedPage {
                page,
                count,
                total_so_far: issues.len(),
                last_page: result.last_page,
            },
        );

        match result.next_page {
            Some(next) if next > page => page = next,
            Some(next) if next > 0 => {
                tracing::warn!(page, next, "Page cursor did not advance; stopping");
                break;
            }
            _ => break,
        }
    }

    emit(
        on_progress,
        RankingProgress::FetchComplete {
            total: issues.len(),
        },
    );

    Ok(issues)
}
