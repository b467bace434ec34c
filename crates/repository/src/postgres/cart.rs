//! Cart repository for `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use marketplace_core::{
    Cart, CartId, CartItem, CartItemId, CartRepository, ProductId, RepositoryError, Result,
};

use super::error::{db_error, to_uuid};
use crate::translate::Operation;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i64,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::from(row.id),
            cart_id: CartId::from(row.cart_id),
            product_id: ProductId::from(row.product_id),
            quantity: row.quantity,
        }
    }
}

impl TryFrom<&CartItem> for CartItemRow {
    type Error = RepositoryError;

    fn try_from(item: &CartItem) -> Result<Self> {
        Ok(Self {
            id: to_uuid("cart item id", &item.id)?,
            cart_id: to_uuid("cart id", &item.cart_id)?,
            product_id: to_uuid("product id", &item.product_id)?,
            quantity: item.quantity,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Carts backed by the `cart` and `cart_product` tables.
#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    #[instrument(skip(self), fields(cart_id = %id))]
    async fn get_cart_by_id(&self, id: &CartId) -> Result<Cart> {
        let cart_id = to_uuid("cart id", id)?;

        let cart = sqlx::query_as::<_, CartRow>("SELECT id, price FROM cart WHERE id = $1")
            .bind(cart_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(Operation::Read))?;

        let items = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, product_id, quantity
            FROM cart_product
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(Cart {
            id: CartId::from(cart.id),
            price: cart.price,
            items: items.into_iter().map(CartItem::from).collect(),
        })
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id, price = cart.price))]
    async fn update_cart(&self, cart: &Cart) -> Result<Cart> {
        sqlx::query("UPDATE cart SET price = $2 WHERE id = $1")
            .bind(to_uuid("cart id", &cart.id)?)
            .bind(cart.price)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Update))?;

        self.get_cart_by_id(&cart.id).await
    }

    #[instrument(skip(self), fields(cart_id = %id))]
    async fn clear_cart(&self, id: &CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_product WHERE cart_id = $1")
            .bind(to_uuid("cart id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart_item_id = %id))]
    async fn get_cart_item_by_id(&self, id: &CartItemId) -> Result<CartItem> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, quantity FROM cart_product WHERE id = $1",
        )
        .bind(to_uuid("cart item id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(row.into())
    }

    #[instrument(skip(self, item), fields(cart_item_id = %item.id, cart_id = %item.cart_id))]
    async fn create_cart_item(&self, item: &CartItem) -> Result<CartItem> {
        let row = CartItemRow::try_from(item)?;

        sqlx::query(
            "INSERT INTO cart_product (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4)",
        )
        .bind(row.id)
        .bind(row.cart_id)
        .bind(row.product_id)
        .bind(row.quantity)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Insert))?;

        self.get_cart_item_by_id(&item.id).await
    }

    #[instrument(skip(self, item), fields(cart_item_id = %item.id))]
    async fn update_cart_item(&self, item: &CartItem) -> Result<CartItem> {
        let row = CartItemRow::try_from(item)?;

        sqlx::query(
            "UPDATE cart_product SET cart_id = $2, product_id = $3, quantity = $4 WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.cart_id)
        .bind(row.product_id)
        .bind(row.quantity)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_cart_item_by_id(&item.id).await
    }

    #[instrument(skip(self), fields(cart_item_id = %id))]
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<()> {
        sqlx::query("DELETE FROM cart_product WHERE id = $1")
            .bind(to_uuid("cart item id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::ErrorKind;

    use super::*;

    #[test]
    fn test_cart_item_row_round_trip() {
        let item = CartItem {
            id: CartItemId::new("30e18bc1-4354-4937-9a3b-03cf0b7031cc"),
            cart_id: CartId::new("30e18bc1-4354-4937-9a3b-03cf0b7034cc"),
            product_id: ProductId::new("30e18bc1-4354-4937-9a3b-03cf0b7027a1"),
            quantity: 2,
        };
        let row = CartItemRow::try_from(&item).unwrap();
        assert_eq!(CartItem::from(row), item);
    }

    #[test]
    fn test_cart_item_with_bad_product_id() {
        let item = CartItem {
            id: CartItemId::generate(),
            cart_id: CartId::generate(),
            product_id: ProductId::new("apple"),
            quantity: 1,
        };
        assert_eq!(
            CartItemRow::try_from(&item).unwrap_err().kind(),
            ErrorKind::InvalidId
        );
    }
}
