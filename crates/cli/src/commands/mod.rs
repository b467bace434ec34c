//! Subcommand implementations.

pub mod check;
pub mod indexes;
pub mod migrate;

use marketplace_repository::{Backend, ConfigError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The command only applies to one backend.
    #[error("`{command}` needs the {expected} backend, but {actual} is configured")]
    WrongBackend {
        command: &'static str,
        expected: Backend,
        actual: Backend,
    },

    #[error("Database error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("MongoDB error: {0}")]
    MongoDb(#[from] mongodb::error::Error),
}

/// Fail unless `actual` is the backend `command` works with.
pub(crate) fn require_backend(
    command: &'static str,
    expected: Backend,
    actual: Backend,
) -> Result<(), CliError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CliError::WrongBackend {
            command,
            expected,
            actual,
        })
    }
}
