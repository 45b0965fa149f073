use std::sync::Arc;

use rankings::{GitHubClient, RankingQuery, RankingReport, rank_pull_requests};

use crate::config::Config;
use crate::progress::ProgressReporter;

/// Arguments of the pulls command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PullsArgs {
    /// GitHub organization
    #[arg(long)]
    pub org: String,

    /// Only count pull requests opened by this user
    #[arg(long)]
    pub user: Option<String>,

    /// Date range, format: yyyy-MM-dd..yyyy-MM-dd
    #[arg(long)]
    pub date_range: Option<String>,

    /// Fetch and log the reviews of every counted pull request
    #[arg(long)]
    pub get_reviews: bool,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub no_rate_limit: bool,
}

/// Handle the pulls command.
pub(crate) async fn handle_pulls(
    args: PullsArgs,
    config: &Config,
    reporter: Arc<ProgressReporter>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate before touching the network.
    let query = RankingQuery::new(
        &args.org,
        args.user.as_deref(),
        args.date_range.as_deref(),
        args.get_reviews,
    )?;

    let token = config.github_token();
    let client = GitHubClient::new(
        &token,
        &config.github.endpoint,
        config.rate_limiter(args.no_rate_limit),
    )?;
    let options = config.ranking_options();
    let callback = reporter.as_callback();

    let result = rank_pull_requests(&client, &query, &options, Some(&callback)).await;
    reporter.finish();

    log_report(&result?);
    Ok(())
}

fn log_report(report: &RankingReport) {
    for entry in &report.ranking {
        tracing::debug!(user = %entry.user, count = entry.count, "Pull request count");
    }
    tracing::info!("markdown ranking:\n{}", report.markdown_table());
    tracing::info!("related repos:\n{}", report.related_repos_list());
}
