//! Configuration file support for rankings.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `RANKINGS_`, e.g., `RANKINGS_GITHUB_TOKEN`)
//! 3. Legacy environment variables (`GH_TOKEN`, `LOG_LEVEL`, `ENVIRONMENT`)
//! 4. Config file (./rankings.toml, then ~/.config/rankings/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use RANKINGS_GITHUB_TOKEN / GH_TOKEN
//! endpoint = "https://api.github.com"
//! exclude = "Snyk"
//!
//! [retry]
//! attempts = 10
//! backoff = 1    # seconds
//! cooldown = 30  # seconds
//!
//! [ratelimit]
//! rpm = 30
//! disabled = false
//!
//! [logging]
//! level = "debug"
//! format = "json"  # or "pretty"
//! environment = "local"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use rankings::github::DEFAULT_API_URL;
use rankings::ranking::DEFAULT_EXCLUDED_TERM;
use rankings::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_BACKOFF, DEFAULT_SECONDARY_COOLDOWN};
use rankings::{ApiRateLimiter, RankingOptions, RetryPolicy, rate_limits};

const ENV_PREFIX: &str = "RANKINGS";

/// Legacy variables and the keys they feed.
const LEGACY_ENV: &[(&str, &str, &str)] = &[
    ("GH_TOKEN", "RANKINGS_GITHUB_TOKEN", "github.token"),
    ("LOG_LEVEL", "RANKINGS_LOGGING_LEVEL", "logging.level"),
    ("ENVIRONMENT", "RANKINGS_LOGGING_ENVIRONMENT", "logging.environment"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub retry: RetryConfig,
    pub ratelimit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    /// Can also be set via RANKINGS_GITHUB_TOKEN or GH_TOKEN.
    pub token: Option<String>,
    /// REST API base URL.
    pub endpoint: String,
    /// Term negated in every search query. Empty disables the exclusion.
    pub exclude: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: DEFAULT_API_URL.to_string(),
            exclude: DEFAULT_EXCLUDED_TERM.to_string(),
        }
    }
}

/// Rate-limit retry options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per request.
    pub attempts: u32,
    /// Floor for a primary rate-limit wait, in seconds.
    pub backoff: u64,
    /// Wait after a secondary rate limit, in seconds.
    pub cooldown: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_MIN_BACKOFF.as_secs(),
            cooldown: DEFAULT_SECONDARY_COOLDOWN.as_secs(),
        }
    }
}

/// Proactive pacing options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per minute.
    pub rpm: u32,
    /// Whether to disable proactive rate limiting.
    pub disabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rpm: rate_limits::GITHUB_SEARCH_DEFAULT_RPM,
            disabled: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for this tool's targets. Overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
    /// `test` discards all log output.
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Json,
            environment: "local".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_silenced(&self) -> bool {
        self.environment.eq_ignore_ascii_case("test")
    }
}

impl Config {
    /// Load configuration from files and the process environment.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/rankings/config.toml)
    /// 3. Local config file (./rankings.toml)
    /// 4. Legacy environment variables
    /// 5. Environment variables with RANKINGS_ prefix
    pub fn load() -> Result<Self, ConfigError> {
        let mut files = Vec::new();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            files.push(xdg_config);
        }

        let local_config = PathBuf::from("rankings.toml");
        if local_config.exists() {
            files.push(local_config);
        }

        Self::from_sources(&files, std::env::vars().collect())
    }

    /// Build configuration from explicit files and environment variables.
    pub fn from_sources(
        files: &[PathBuf],
        env: config::Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        for path in files {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Legacy variables rank below their RANKINGS_ equivalents. Empty values are unset.
        for (legacy, modern, key) in LEGACY_ENV {
            if env.contains_key(*modern) {
                continue;
            }
            let value = env.get(*legacy).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        // e.g., RANKINGS_RETRY_ATTEMPTS -> retry.attempts
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("_")
                .try_parsing(true)
                .source(Some(env)),
        );

        builder.build()?.try_deserialize()
    }

    /// The bearer token, empty when none is configured.
    pub fn github_token(&self) -> String {
        self.github.token.clone().unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.attempts,
            Duration::from_secs(self.retry.backoff),
            Duration::from_secs(self.retry.cooldown),
        )
    }

    pub fn ranking_options(&self) -> RankingOptions {
        let exclude = self.github.exclude.trim();
        RankingOptions {
            retry: self.retry_policy(),
            exclude: (!exclude.is_empty()).then(|| exclude.to_string()),
        }
    }

    /// The proactive limiter, unless disabled here or by the `--no-rate-limit` flag.
    pub fn rate_limiter(&self, no_rate_limit: bool) -> Option<ApiRateLimiter> {
        if no_rate_limit || self.ratelimit.disabled {
            None
        } else {
            Some(ApiRateLimiter::per_minute(self.ratelimit.rpm))
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rankings").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
