//! Tracing subscriber setup.

use console::Term;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Map a configured level name to a filter. Unknown or blank names fall back to debug.
fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "" => LevelFilter::DEBUG,
        "warning" => LevelFilter::WARN,
        "fatal" | "panic" => LevelFilter::ERROR,
        other => other.parse().unwrap_or(LevelFilter::DEBUG),
    }
}

/// Default directives for this tool's crates.
fn default_directives(level: &str) -> String {
    let level = parse_level(level).to_string().to_ascii_lowercase();
    format!("rankings={level},rankings_cli={level}")
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
pub(crate) fn init(config: &LoggingConfig) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_directives(&config.level)),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    if config.is_silenced() {
        builder.with_writer(std::io::sink).init();
        return;
    }

    match config.format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .init(),
        LogFormat::Pretty => builder
            .with_target(false)
            .with_ansi(Term::stdout().is_term())
            .init(),
    }
}
