//! Database migration operations.

use prwatch::persistence::{PersistenceError, migrate_database};
use prwatch::telemetry::StderrJsonlTelemetrySink;
use prwatch::{PollError, WatchConfig};
use tracing::info;

/// Runs database migrations.
///
/// # Errors
///
/// Returns [`PollError::Configuration`] if the database URL is missing or
/// blank, and [`PollError::Persistence`] for connection or migration
/// failures.
pub fn run(config: &WatchConfig) -> Result<(), PollError> {
    let database_url =
        config
            .database_url
            .as_deref()
            .ok_or_else(|| PollError::Configuration {
                message: PersistenceError::MissingDatabaseUrl.to_string(),
            })?;

    let telemetry = StderrJsonlTelemetrySink;
    let version =
        migrate_database(database_url, &telemetry).map_err(|error| map_persistence_error(&error))?;
    info!(schema_version = version.as_str(), "database migrated");
    Ok(())
}

/// Blank URLs are a configuration problem; everything else is a runtime
/// persistence failure.
fn map_persistence_error(error: &PersistenceError) -> PollError {
    if is_configuration_error(error) {
        PollError::Configuration {
            message: error.to_string(),
        }
    } else {
        PollError::Persistence(error.clone())
    }
}

const fn is_configuration_error(error: &PersistenceError) -> bool {
    matches!(error, PersistenceError::BlankDatabaseUrl)
}
