//! `PostgreSQL` backend.
//!
//! ## Tables
//!
//! - `user` - Accounts (quoted, `user` is reserved)
//! - `cart` / `cart_product` - One cart per user and its lines
//! - `product` - Catalogue
//! - `shop` / `shop_product` - Shops and the stock they carry
//! - `order_customer` / `order_shop` / `order_shop_product` - Order trees
//! - `withdraw` - Shop payout requests
//!
//! Identifiers are `UUID` columns. Domain IDs that do not parse as UUIDs are
//! rejected with `InvalidId` before any query runs.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/repository/migrations/` and run via:
//! ```bash
//! cargo run -p marketplace-cli -- migrate
//! ```

mod cart;
mod error;
mod order;
mod product;
mod shop;
mod user;
mod withdraw;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;

pub use cart::PgCartRepository;
pub use order::PgOrderRepository;
pub use product::PgProductRepository;
pub use shop::PgShopRepository;
pub use user::PgUserRepository;
pub use withdraw::PgWithdrawRepository;

use crate::config::StorageConfig;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool sized from the storage config.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &StorageConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history does
/// not match the embedded files.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Round-trip a trivial query to confirm the pool is usable.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be reached.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
