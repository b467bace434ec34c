//! Cart repository for `MongoDB`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{Cart, CartId, CartItem, CartItemId, CartRepository, ProductId, Result};

use super::error::{mongo_error, not_found};
use super::{CART, CART_PRODUCT, ensure_indexes_for};
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct CartRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CartItemRecord {
    #[serde(rename = "_id")]
    id: String,
    cart_id: String,
    product_id: String,
    quantity: i64,
}

impl From<&CartItem> for CartItemRecord {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.as_str().to_owned(),
            cart_id: item.cart_id.as_str().to_owned(),
            product_id: item.product_id.as_str().to_owned(),
            quantity: item.quantity,
        }
    }
}

impl From<CartItemRecord> for CartItem {
    fn from(record: CartItemRecord) -> Self {
        Self {
            id: CartItemId::new(record.id),
            cart_id: CartId::new(record.cart_id),
            product_id: ProductId::new(record.product_id),
            quantity: record.quantity,
        }
    }
}

/// Carts backed by the `cart` and `cart_product` collections.
#[derive(Debug, Clone)]
pub struct MongoCartRepository {
    carts: Collection<CartRecord>,
    items: Collection<CartItemRecord>,
}

impl MongoCartRepository {
    /// Bind to `db` and ensure the unique `(cart_id, product_id)` index.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the index cannot be created.
    pub async fn new(db: &Database) -> mongodb::error::Result<Self> {
        ensure_indexes_for(db, &[CART_PRODUCT]).await?;
        Ok(Self {
            carts: db.collection(CART),
            items: db.collection(CART_PRODUCT),
        })
    }
}

#[async_trait]
impl CartRepository for MongoCartRepository {
    #[instrument(skip(self), fields(cart_id = %id))]
    async fn get_cart_by_id(&self, id: &CartId) -> Result<Cart> {
        let cart = self
            .carts
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("cart", id))?;

        let items: Vec<CartItemRecord> = self
            .items
            .find(doc! { "cart_id": id.as_str() })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        Ok(Cart {
            id: CartId::new(cart.id),
            price: cart.price,
            items: items.into_iter().map(CartItem::from).collect(),
        })
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id, price = cart.price))]
    async fn update_cart(&self, cart: &Cart) -> Result<Cart> {
        self.carts
            .update_one(
                doc! { "_id": cart.id.as_str() },
                doc! { "$set": { "price": cart.price } },
            )
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_cart_by_id(&cart.id).await
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn clear_cart(&self, id: &CartId) -> Result<()> {
        self.items
            .delete_many(doc! { "cart_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart_item_id = %id))]
    async fn get_cart_item_by_id(&self, id: &CartItemId) -> Result<CartItem> {
        let record = self
            .items
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("cart item", id))?;
        Ok(record.into())
    }

    #[instrument(skip(self, item), fields(cart_item_id = %item.id, cart_id = %item.cart_id))]
    async fn create_cart_item(&self, item: &CartItem) -> Result<CartItem> {
        self.items
            .insert_one(CartItemRecord::from(item))
            .await
            .map_err(mongo_error(Operation::Insert))?;

        self.get_cart_item_by_id(&item.id).await
    }

    #[instrument(skip(self, item), fields(cart_item_id = %item.id))]
    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem> {
        self.items
            .replace_one(doc! { "_id": item.id.as_str() }, CartItemRecord::from(item))
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_cart_item_by_id(&item.id).await
    }

    #[instrument(skip(self), fields(cart_item_id = %id))]
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<()> {
        self.items
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }
}
