//! `mp-cli migrate` - apply the embedded `PostgreSQL` migrations.
//!
//! Migrations live in `crates/repository/migrations/` and are compiled into
//! the binary, so the command needs only `MARKETPLACE_DATABASE_URL`.

use marketplace_repository::postgres::{self, MIGRATOR};
use marketplace_repository::{Backend, StorageConfig};

use super::{CliError, require_backend};

/// Connect to `PostgreSQL` and run every pending migration.
///
/// # Errors
///
/// Returns `CliError` if the backend is not `postgres`, the database is
/// unreachable, or a migration fails.
pub async fn run(config: &StorageConfig) -> Result<(), CliError> {
    require_backend("migrate", Backend::Postgres, config.backend)?;

    tracing::info!("Connecting to PostgreSQL...");
    let pool = postgres::create_pool(config).await?;

    tracing::info!(migrations = MIGRATOR.iter().count(), "Running migrations...");
    postgres::run_migrations(&pool).await?;

    tracing::info!("Migrations complete");
    pool.close().await;
    Ok(())
}
