//! prwatch entrypoint: polls GitHub and reports pull request changes.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use prwatch::{PollError, WatchConfig};
use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_LOG_FILTER: &str = "prwatch=info";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), PollError> {
    let config = load_config()?;

    if config.migrate_db {
        return cli::migrations::run(&config);
    }

    cli::watch::run(&config).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`PollError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<WatchConfig, PollError> {
    WatchConfig::load().map_err(|error| PollError::Configuration {
        message: error.to_string(),
    })
}

/// Logs go to stderr so stdout stays free for notification output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
