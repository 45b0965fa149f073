use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rankings::RankingProgress;

/// Running totals shown next to the spinner.
#[derive(Default)]
struct ProgressState {
    day: Option<String>,
    issues: usize,
    reviews: usize,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    bar: ProgressBar,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    /// A reporter that draws nothing.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(Self::spinner_style());
        bar.set_prefix(format!("{:10}", "Rankings"));
        Self {
            bar,
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn handle(&self, event: RankingProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            RankingProgress::QueryingDay { day } => {
                self.bar
                    .set_message(format!("{} ({} PRs so far)", day, state.issues));
                state.day = Some(day);
            }

            RankingProgress::SkippedDay { day } => {
                self.bar.set_message(format!("{} already processed", day));
            }

            RankingProgress::FetchingPages { .. } => {}

            RankingProgress::FetchedPage {
                page,
                total_so_far,
                last_page,
                ..
            } => {
                let day = state.day.as_deref().unwrap_or("all time");
                let pages = match last_page {
                    Some(last) => format!("page {}/{}", page, last),
                    None => format!("page {}", page),
                };
                self.bar.set_message(format!(
                    "{} {} ({} PRs so far)",
                    day,
                    pages,
                    state.issues + total_so_far
                ));
            }

            RankingProgress::FetchComplete { total } => {
                state.issues += total;
            }

            RankingProgress::RateLimitBackoff {
                kind,
                operation,
                retry_after,
                attempt,
            } => {
                self.bar.set_message(format!(
                    "⏳ {} rate limit on {}, retry {} in {:.0}s",
                    kind,
                    operation,
                    attempt,
                    retry_after.as_secs_f64()
                ));
            }

            RankingProgress::FetchingReviews { repo, number } => {
                self.bar.set_message(format!(
                    "Reviews of {}#{} ({} seen)",
                    repo, number, state.reviews
                ));
            }

            RankingProgress::ReviewedBy { .. } => {
                state.reviews += 1;
            }

            RankingProgress::AggregationComplete {
                authors, issues, ..
            } => {
                self.bar.finish_with_message(format!(
                    "✓ {} PRs from {} authors",
                    issues, authors
                ));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
