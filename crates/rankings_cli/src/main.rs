//! Rankings CLI - rank an organization's contributors by pull request count.

mod commands;
mod config;
mod logging;
mod progress;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::Term;

use crate::commands::limits::OutputFormat;
use crate::commands::pulls::PullsArgs;
use crate::config::LogFormat;
use crate::progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "rankings")]
#[command(version)]
#[command(about = "Rank GitHub organization contributors by pull request count")]
#[command(
    long_about = "Rankings searches an organization's pull requests, optionally one day at a \
time over a date range, and ranks authors by how many pull requests they opened. Primary and \
secondary rate limits are waited out automatically."
)]
#[command(after_long_help = r#"EXAMPLES
    Rank all contributors of an organization:
        $ rankings pulls --org rust-lang

    Rank contributors for one month, logging reviewers too:
        $ rankings pulls --org rust-lang --date-range 2024-03-01..2024-03-31 --get-reviews

    Count a single user's pull requests:
        $ rankings pulls --org rust-lang --user alice

    Show remaining API quota:
        $ rankings limits

CONFIGURATION
    Rankings reads configuration from:
      1. ~/.config/rankings/config.toml (or $XDG_CONFIG_HOME/rankings/config.toml)
      2. ./rankings.toml
      3. Environment variables (RANKINGS_* prefix, e.g., RANKINGS_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    RANKINGS_GITHUB_TOKEN     GitHub personal access token (legacy: GH_TOKEN)
    RANKINGS_GITHUB_ENDPOINT  REST API base URL (default: https://api.github.com)
    RANKINGS_LOGGING_LEVEL    Log level (legacy: LOG_LEVEL, default: debug)
    RANKINGS_LOGGING_FORMAT   json or pretty (default: json)
    RUST_LOG                  Full tracing filter, overrides the log level
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank contributors by pull request count
    Pulls(PullsArgs),
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Handle commands that need neither configuration nor logging first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load()?;
    logging::init(&config.logging);

    shutdown::setup_shutdown_handler();

    match cli.command {
        Commands::Pulls(args) => {
            let interactive = Term::stderr().is_term()
                && config.logging.format == LogFormat::Pretty
                && !config.logging.is_silenced();
            let reporter = Arc::new(ProgressReporter::new(interactive));
            commands::pulls::handle_pulls(args, &config, reporter).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(output, &config).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
