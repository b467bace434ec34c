//! `mp-cli indexes` - create the `MongoDB` unique indexes.
//!
//! Safe to repeat: creating an index that already exists with the same
//! keys and options is a no-op on the server.

use marketplace_repository::mongodb;
use marketplace_repository::{Backend, StorageConfig};

use super::{CliError, require_backend};

/// Connect to `MongoDB` and ensure every unique index exists.
///
/// # Errors
///
/// Returns `CliError` if the backend is not `mongodb`, the deployment is
/// unreachable, or existing documents violate an index.
pub async fn run(config: &StorageConfig) -> Result<(), CliError> {
    require_backend("indexes", Backend::MongoDb, config.backend)?;

    tracing::info!(database = %config.mongo_database, "Connecting to MongoDB...");
    let db = mongodb::connect(config).await?;

    mongodb::ensure_indexes(&db).await?;
    tracing::info!("Indexes ensured");
    Ok(())
}
