//! Cachet credits - fetch the credits feed from the command line
//!
//! Prints the credits document as pretty JSON, or reports that credits are
//! unavailable (disabled, or the feed could not be fetched).

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cachet_credits::cache::{FileStore, MemoryStore, Repository, Store};
use cachet_credits::cli::{CacheBackend, Cli, StartupConfig};
use cachet_credits::{Credits, CreditsConfig, FetchResult};

/// Sets up logging to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Fetches credits through `store` and prints the outcome
async fn run<S: Store>(store: S, config: CreditsConfig, refresh: bool) -> ExitCode {
    let cache = Arc::new(Repository::new(store));
    let credits = match Credits::new(cache, config) {
        Ok(credits) => credits,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let result = if refresh {
        credits.refresh().await
    } else {
        credits.latest().await
    };

    match result {
        FetchResult::Value(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {}", err);
                ExitCode::from(2)
            }
        },
        FetchResult::Absent => {
            eprintln!("Credits are unavailable");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let StartupConfig {
        credits,
        cache,
        refresh,
    } = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    match cache {
        CacheBackend::Memory => run(MemoryStore::new(), credits, refresh).await,
        CacheBackend::File(dir) => run(FileStore::with_dir(dir), credits, refresh).await,
    }
}
