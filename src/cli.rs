//! Command-line interface parsing for the credits fetcher
//!
//! Maps clap arguments (with environment fallbacks for the URL and the
//! disable switch) into a [`StartupConfig`].

use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::FileStore;
use crate::credits::CreditsConfig;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The URL is not an absolute http(s) URL
    #[error("Invalid URL: '{0}'. Expected an absolute http or https URL")]
    InvalidUrl(String),

    /// No cache directory was given and none could be determined
    #[error("Could not determine a cache directory; pass --cache-dir or --memory-cache")]
    NoCacheDir,
}

/// Cachet credits - fetch the credits feed through a local cache
#[derive(Parser, Debug)]
#[command(name = "cachet-credits")]
#[command(about = "Fetch the Cachet credits feed, caching successes and failures")]
#[command(version)]
pub struct Cli {
    /// Credits feed URL
    #[arg(long, env = "CACHET_CREDITS_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Never make outbound requests; credits are always unavailable
    #[arg(long, env = "CACHET_CREDITS_DISABLED")]
    pub disabled: bool,

    /// Version reported in the User-Agent header
    #[arg(long, value_name = "VERSION")]
    pub product_version: Option<String>,

    /// Directory for cached entries (defaults to the user cache directory)
    #[arg(long, value_name = "DIR", conflicts_with = "memory_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory for this run only
    #[arg(long)]
    pub memory_cache: bool,

    /// Ignore any cached entry and fetch again
    #[arg(long)]
    pub refresh: bool,
}

/// Where cached entries live
#[derive(Debug, Clone, PartialEq)]
pub enum CacheBackend {
    Memory,
    File(PathBuf),
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Fetcher configuration
    pub credits: CreditsConfig,
    /// Cache backend to use
    pub cache: CacheBackend,
    /// Whether to drop the cached entry before fetching
    pub refresh: bool,
}

/// Checks that `s` is an absolute http(s) URL
pub fn parse_url_arg(s: &str) -> Result<String, CliError> {
    match Url::parse(s) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(s.to_string()),
        _ => Err(CliError::InvalidUrl(s.to_string())),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the URL is invalid or no cache directory is available
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut credits = CreditsConfig::default().with_enabled(!cli.disabled);
        if let Some(url) = &cli.url {
            credits = credits.with_url(parse_url_arg(url)?);
        }
        if let Some(version) = &cli.product_version {
            credits = credits.with_product_version(version.clone());
        }

        let cache = match (&cli.cache_dir, cli.memory_cache) {
            (_, true) => CacheBackend::Memory,
            (Some(dir), false) => CacheBackend::File(dir.clone()),
            (None, false) => {
                let store = FileStore::new().ok_or(CliError::NoCacheDir)?;
                CacheBackend::File(store.dir().to_path_buf())
            }
        };

        Ok(StartupConfig {
            credits,
            cache,
            refresh: cli.refresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::DEFAULT_URL;

    #[test]
    fn test_parse_url_arg_accepts_http_and_https() {
        assert!(parse_url_arg("https://cachethq.io/credits").is_ok());
        assert!(parse_url_arg("http://127.0.0.1:8080/credits").is_ok());
    }

    #[test]
    fn test_parse_url_arg_invalid() {
        let err = parse_url_arg("not a url").unwrap_err();
        assert!(err.to_string().contains("Invalid URL"));
        assert!(err.to_string().contains("not a url"));
        assert!(parse_url_arg("ftp://example.com/credits").is_err());
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["cachet-credits"]);
        assert!(!cli.disabled);
        assert!(!cli.memory_cache);
        assert!(!cli.refresh);
        assert!(cli.cache_dir.is_none());
        assert!(cli.product_version.is_none());
    }

    #[test]
    fn test_cli_rejects_cache_dir_with_memory_cache() {
        let result =
            Cli::try_parse_from(["cachet-credits", "--cache-dir", "/tmp/x", "--memory-cache"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_config_memory_cache() {
        let cli = Cli::parse_from(["cachet-credits", "--memory-cache", "--refresh"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache, CacheBackend::Memory);
        assert!(config.refresh);
        assert!(config.credits.enabled);
        assert_eq!(config.credits.url, DEFAULT_URL);
    }

    #[test]
    fn test_startup_config_with_all_options() {
        let cli = Cli::parse_from([
            "cachet-credits",
            "--url",
            "http://localhost:9000/credits",
            "--disabled",
            "--product-version",
            "2.4.0",
            "--cache-dir",
            "/tmp/credits-cache",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(!config.credits.enabled);
        assert_eq!(config.credits.url, "http://localhost:9000/credits");
        assert_eq!(config.credits.product_version.as_deref(), Some("2.4.0"));
        assert_eq!(
            config.cache,
            CacheBackend::File(PathBuf::from("/tmp/credits-cache"))
        );
    }

    #[test]
    fn test_startup_config_invalid_url() {
        let cli = Cli::parse_from(["cachet-credits", "--url", "nope", "--memory-cache"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidUrl(_))
        ));
    }
}
