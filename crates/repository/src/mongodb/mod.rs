//! `MongoDB` backend.
//!
//! ## Collections
//!
//! Same names as the relational tables: `user`, `cart`, `cart_product`,
//! `product`, `shop`, `shop_product`, `order_customer`, `order_shop`,
//! `order_shop_product`, `withdraw`. Every document uses the domain ID text
//! as its `_id`.
//!
//! Composite writes run in multi-document transactions, so the deployment
//! must be a replica set (a single-node replica set is enough).
//!
//! Repository constructors create the unique indexes of the collections they
//! own. [`ensure_indexes`] creates all of them at once.

mod cart;
mod error;
mod order;
mod product;
mod shop;
mod user;
mod withdraw;

use mongodb::bson::{Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Client, ClientSession, Database, IndexModel};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

pub use cart::MongoCartRepository;
pub use order::MongoOrderRepository;
pub use product::MongoProductRepository;
pub use shop::MongoShopRepository;
pub use user::MongoUserRepository;
pub use withdraw::MongoWithdrawRepository;

use marketplace_core::Result;

use crate::config::StorageConfig;
use crate::translate::Operation;
use error::mongo_error;

pub const USER: &str = "user";
pub const CART: &str = "cart";
pub const CART_PRODUCT: &str = "cart_product";
pub const PRODUCT: &str = "product";
pub const SHOP: &str = "shop";
pub const SHOP_PRODUCT: &str = "shop_product";
pub const ORDER_CUSTOMER: &str = "order_customer";
pub const ORDER_SHOP: &str = "order_shop";
pub const ORDER_SHOP_PRODUCT: &str = "order_shop_product";
pub const WITHDRAW: &str = "withdraw";

/// Unique indexes per collection, as `(collection, key fields)`.
const UNIQUE_INDEXES: &[(&str, &[&str])] = &[
    (USER, &["email"]),
    (CART_PRODUCT, &["cart_id", "product_id"]),
    (SHOP_PRODUCT, &["shop_id", "product_id"]),
    (ORDER_SHOP, &["shop_id", "order_customer_id"]),
    (ORDER_SHOP_PRODUCT, &["order_shop_id", "product_id"]),
];

/// Connect to the configured deployment and select the marketplace database.
///
/// # Errors
///
/// Returns the driver error if the connection string is invalid.
pub async fn connect(config: &StorageConfig) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(config.database_url.expose_secret()).await?;
    Ok(client.database(&config.mongo_database))
}

/// Create every unique index the repositories rely on.
///
/// # Errors
///
/// Returns the driver error if an index cannot be created, for example when
/// existing documents already violate it.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let collections: Vec<&str> = UNIQUE_INDEXES.iter().map(|(name, _)| *name).collect();
    ensure_indexes_for(db, &collections).await
}

/// Create the unique indexes of the given collections.
pub(crate) async fn ensure_indexes_for(
    db: &Database,
    collections: &[&str],
) -> mongodb::error::Result<()> {
    for (collection, fields) in UNIQUE_INDEXES
        .iter()
        .filter(|(name, _)| collections.contains(name))
    {
        let mut keys = Document::new();
        for field in *fields {
            keys.insert(*field, 1_i32);
        }
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        db.collection::<Document>(collection)
            .create_index(model)
            .await?;
        debug!(collection, ?fields, "unique index ensured");
    }
    Ok(())
}

/// Send `ping` to the server.
///
/// # Errors
///
/// Returns the driver error if the deployment cannot be reached.
pub async fn ping(db: &Database) -> mongodb::error::Result<()> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}

/// Open a session with a running transaction.
pub(crate) async fn begin(client: &Client) -> Result<ClientSession> {
    let mut session = client
        .start_session()
        .await
        .map_err(mongo_error(Operation::Transaction))?;
    session
        .start_transaction()
        .await
        .map_err(mongo_error(Operation::Transaction))?;
    Ok(session)
}

/// Commit `session` if `outcome` is `Ok`, abort it otherwise.
///
/// The step error is returned unchanged; a failed commit is a
/// `TransactionError`.
pub(crate) async fn finish(
    mut session: ClientSession,
    outcome: Result<()>,
    what: &str,
) -> Result<()> {
    match outcome {
        Ok(()) => session
            .commit_transaction()
            .await
            .map_err(mongo_error(Operation::Transaction)),
        Err(err) => {
            warn!(error = %err, "rolling back {what}");
            if let Err(abort_err) = session.abort_transaction().await {
                warn!(error = %abort_err, "abort failed");
            }
            Err(err)
        }
    }
}
