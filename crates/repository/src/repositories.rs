//! Backend selection.
//!
//! [`Repositories`] hands out one trait object per aggregate so callers never
//! name a concrete backend.

use std::sync::Arc;

use mongodb::Database;
use sqlx::PgPool;
use tracing::info;

use marketplace_core::{
    CartRepository, OrderRepository, ProductRepository, ShopRepository, UserRepository,
    WithdrawRepository,
};

use crate::config::{Backend, StorageConfig};
use crate::mongodb::{
    self as mongo, MongoCartRepository, MongoOrderRepository, MongoProductRepository,
    MongoShopRepository, MongoUserRepository, MongoWithdrawRepository,
};
use crate::postgres::{
    self, PgCartRepository, PgOrderRepository, PgProductRepository, PgShopRepository,
    PgUserRepository, PgWithdrawRepository,
};

/// Error opening a backend from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("mongodb: {0}")]
    MongoDb(#[from] mongodb::error::Error),
}

/// Every repository, bound to the same backend.
///
/// Cheap to clone; each handle is an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub shops: Arc<dyn ShopRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub withdraws: Arc<dyn WithdrawRepository>,
}

impl Repositories {
    /// Bind every repository to a `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            shops: Arc::new(PgShopRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            withdraws: Arc::new(PgWithdrawRepository::new(pool.clone())),
        }
    }

    /// Bind every repository to a `MongoDB` database, creating the unique
    /// indexes they rely on.
    ///
    /// # Errors
    ///
    /// Returns the driver error if an index cannot be created.
    pub async fn mongodb(db: &Database) -> mongodb::error::Result<Self> {
        Ok(Self {
            users: Arc::new(MongoUserRepository::new(db).await?),
            carts: Arc::new(MongoCartRepository::new(db).await?),
            products: Arc::new(MongoProductRepository::new(db)),
            shops: Arc::new(MongoShopRepository::new(db).await?),
            orders: Arc::new(MongoOrderRepository::new(db).await?),
            withdraws: Arc::new(MongoWithdrawRepository::new(db)),
        })
    }

    /// Open the backend named in `config` and bind every repository to it.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` if the backend cannot be reached or prepared.
    pub async fn connect(config: &StorageConfig) -> Result<Self, ConnectError> {
        info!(backend = %config.backend, "opening storage backend");
        match config.backend {
            Backend::Postgres => {
                let pool = postgres::create_pool(config).await?;
                Ok(Self::postgres(&pool))
            }
            Backend::MongoDb => {
                let db = mongo::connect(config).await?;
                Ok(Self::mongodb(&db).await?)
            }
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
