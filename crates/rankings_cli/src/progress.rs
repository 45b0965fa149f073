//! Progress reporting for ranking runs.
//!
//! This module provides two modes of progress reporting:
//! - Interactive mode (TTY): A spinner using indicatif
//! - Logging mode (non-TTY or JSON logs): Structured logging using tracing

mod interactive;
mod logging;

use std::sync::Arc;

use rankings::{ProgressCallback, RankingProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Spinner on stderr.
    Interactive(InteractiveReporter),
    /// Structured log lines.
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Use the spinner only when it will not interleave with log lines a
    /// machine is reading.
    pub fn new(interactive: bool) -> Self {
        if interactive {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: RankingProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| {
            reporter.handle(event);
        })
    }

    /// Finish the spinner (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}
