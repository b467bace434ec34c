//! `mp-cli check` - confirm the configured backend is reachable.

use marketplace_repository::{Backend, StorageConfig, mongodb, postgres};

use super::CliError;

/// Connect to the configured backend and round-trip a ping.
///
/// # Errors
///
/// Returns `CliError` if the connection or the ping fails.
pub async fn run(config: &StorageConfig) -> Result<(), CliError> {
    tracing::info!(?config, "Checking storage backend");

    match config.backend {
        Backend::Postgres => {
            let pool = postgres::create_pool(config).await?;
            postgres::ping(&pool).await?;
            pool.close().await;
        }
        Backend::MongoDb => {
            let db = mongodb::connect(config).await?;
            mongodb::ping(&db).await?;
        }
    }

    tracing::info!(backend = %config.backend, "Backend reachable");
    Ok(())
}
