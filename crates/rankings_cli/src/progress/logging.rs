use rankings::RankingProgress;

/// Logging reporter using tracing for structured output.
///
/// Days, pages, backoffs and reviewers are already logged by the library where
/// they happen, so only the run milestones are written here.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: RankingProgress) {
        match event {
            RankingProgress::FetchComplete { total } => {
                tracing::debug!(total, "Fetch complete");
            }

            RankingProgress::FetchingReviews { repo, number } => {
                tracing::debug!(repo = %repo, number, "Fetching reviews");
            }

            RankingProgress::AggregationComplete {
                authors,
                repos,
                issues,
            } => {
                tracing::info!(authors, repos, issues, "Aggregation complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use rankings::RateLimitKind;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged(event: RankingProgress) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || LoggingReporter::new().handle(event));

        String::from_utf8(captured.0.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_library_logged_events_are_not_repeated() {
        let events = [
            RankingProgress::QueryingDay {
                day: "2024-01-01".to_string(),
            },
            RankingProgress::SkippedDay {
                day: "2024-01-01".to_string(),
            },
            RankingProgress::FetchingPages {
                query: "is:pr org:acme".to_string(),
            },
            RankingProgress::FetchedPage {
                page: 1,
                count: 100,
                total_so_far: 100,
                last_page: Some(2),
            },
            RankingProgress::RateLimitBackoff {
                kind: RateLimitKind::Secondary,
                operation: "search page 2".to_string(),
                retry_after: Duration::from_secs(30),
                attempt: 1,
            },
            RankingProgress::ReviewedBy {
                repo: "widgets".to_string(),
                number: 7,
                reviewer: "carol".to_string(),
            },
        ];

        for event in events {
            let output = logged(event.clone());
            assert!(output.is_empty(), "{event:?} logged twice: {output}");
        }
    }

    #[test]
    fn test_milestones_are_logged() {
        let output = logged(RankingProgress::AggregationComplete {
            authors: 3,
            repos: 2,
            issues: 250,
        });
        assert!(output.contains("Aggregation complete"));
        assert!(output.contains("authors=3"));

        let output = logged(RankingProgress::FetchComplete { total: 250 });
        assert!(output.contains("Fetch complete"));
    }
}
