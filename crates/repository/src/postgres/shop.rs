//! Shop repository for `PostgreSQL`.
//!
//! A shop item is created together with the product it sells, inside one
//! transaction.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use marketplace_core::{
    Product, ProductId, RepositoryError, Result, Shop, ShopId, ShopItem, ShopItemId,
    ShopRepository, UserId,
};

use super::error::{db_error, to_uuid};
use super::product::{ProductRow, insert_product};
use crate::page::Page;
use crate::translate::Operation;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct ShopRow {
    id: Uuid,
    seller_id: Uuid,
    name: String,
    description: String,
    requisites: String,
    email: String,
}

impl ShopRow {
    fn into_shop(self, items: Vec<ShopItem>) -> Shop {
        Shop {
            id: ShopId::from(self.id),
            seller_id: UserId::from(self.seller_id),
            name: self.name,
            description: self.description,
            requisites: self.requisites,
            email: self.email,
            items,
        }
    }
}

impl TryFrom<&Shop> for ShopRow {
    type Error = RepositoryError;

    fn try_from(shop: &Shop) -> Result<Self> {
        Ok(Self {
            id: to_uuid("shop id", &shop.id)?,
            seller_id: to_uuid("seller id", &shop.seller_id)?,
            name: shop.name.clone(),
            description: shop.description.clone(),
            requisites: shop.requisites.clone(),
            email: shop.email.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub(super) struct ShopItemRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
}

impl From<ShopItemRow> for ShopItem {
    fn from(row: ShopItemRow) -> Self {
        Self {
            id: ShopItemId::from(row.id),
            shop_id: ShopId::from(row.shop_id),
            product_id: ProductId::from(row.product_id),
            quantity: row.quantity,
        }
    }
}

impl TryFrom<&ShopItem> for ShopItemRow {
    type Error = RepositoryError;

    fn try_from(item: &ShopItem) -> Result<Self> {
        Ok(Self {
            id: to_uuid("shop item id", &item.id)?,
            shop_id: to_uuid("shop id", &item.shop_id)?,
            product_id: to_uuid("product id", &item.product_id)?,
            quantity: item.quantity,
        })
    }
}

const SHOP_COLUMNS: &str = "id, seller_id, name, description, requisites, email";
pub(super) const SHOP_ITEM_COLUMNS: &str = "id, shop_id, product_id, quantity";

// =============================================================================
// Repository
// =============================================================================

/// Shops backed by the `shop` and `shop_product` tables.
#[derive(Debug, Clone)]
pub struct PgShopRepository {
    pool: PgPool,
}

impl PgShopRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_of_shop(&self, shop_id: Uuid) -> Result<Vec<ShopItem>> {
        let rows = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {SHOP_ITEM_COLUMNS} FROM shop_product WHERE shop_id = $1 ORDER BY id"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(rows.into_iter().map(ShopItem::from).collect())
    }

    async fn with_items(&self, rows: Vec<ShopRow>) -> Result<Vec<Shop>> {
        let mut shops = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_of_shop(row.id).await?;
            shops.push(row.into_shop(items));
        }
        Ok(shops)
    }

    async fn insert_item_with_product(
        conn: &mut PgConnection,
        item: &ShopItemRow,
        product: &ProductRow,
    ) -> Result<()> {
        insert_product(&mut *conn, product).await?;
        debug!(product_id = %product.id, "product inserted");

        sqlx::query(
            "INSERT INTO shop_product (id, shop_id, product_id, quantity) VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(item.shop_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await
        .map_err(db_error(Operation::Insert))?;
        debug!(shop_item_id = %item.id, "shop item inserted");

        Ok(())
    }
}

#[async_trait]
impl ShopRepository for PgShopRepository {
    #[instrument(skip(self))]
    async fn get_shops(&self, limit: i64, offset: i64) -> Result<Vec<Shop>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shop ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        self.with_items(rows).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn get_shop_by_id(&self, id: &ShopId) -> Result<Shop> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shop WHERE id = $1"
        ))
        .bind(to_uuid("shop id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        let items = self.items_of_shop(row.id).await?;
        Ok(row.into_shop(items))
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn get_shops_by_seller_id(&self, seller_id: &UserId) -> Result<Vec<Shop>> {
        let rows = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shop WHERE seller_id = $1 ORDER BY id"
        ))
        .bind(to_uuid("seller id", seller_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        self.with_items(rows).await
    }

    #[instrument(skip(self, shop), fields(shop_id = %shop.id, seller_id = %shop.seller_id))]
    async fn create_shop(&self, shop: &Shop) -> Result<Shop> {
        let row = ShopRow::try_from(shop)?;

        sqlx::query(
            r"
            INSERT INTO shop (id, seller_id, name, description, requisites, email)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(row.id)
        .bind(row.seller_id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.requisites)
        .bind(&row.email)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Insert))?;

        self.get_shop_by_id(&shop.id).await
    }

    #[instrument(skip(self, shop), fields(shop_id = %shop.id))]
    async fn update_shop(&self, shop: &Shop) -> Result<Shop> {
        let row = ShopRow::try_from(shop)?;

        sqlx::query(
            r"
            UPDATE shop
            SET seller_id = $2, name = $3, description = $4, requisites = $5, email = $6
            WHERE id = $1
            ",
        )
        .bind(row.id)
        .bind(row.seller_id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.requisites)
        .bind(&row.email)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_shop_by_id(&shop.id).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    async fn delete_shop(&self, id: &ShopId) -> Result<()> {
        sqlx::query("DELETE FROM shop WHERE id = $1")
            .bind(to_uuid("shop id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_shop_items(&self, limit: i64, offset: i64) -> Result<Vec<ShopItem>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {SHOP_ITEM_COLUMNS} FROM shop_product ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(rows.into_iter().map(ShopItem::from).collect())
    }

    #[instrument(skip(self), fields(shop_item_id = %id))]
    async fn get_shop_item_by_id(&self, id: &ShopItemId) -> Result<ShopItem> {
        let row = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {SHOP_ITEM_COLUMNS} FROM shop_product WHERE id = $1"
        ))
        .bind(to_uuid("shop item id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn get_shop_item_by_product_id(&self, product_id: &ProductId) -> Result<ShopItem> {
        let row = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {SHOP_ITEM_COLUMNS} FROM shop_product WHERE product_id = $1 ORDER BY id LIMIT 1"
        ))
        .bind(to_uuid("product id", product_id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(row.into())
    }

    #[instrument(
        skip(self, item, product),
        fields(shop_item_id = %item.id, shop_id = %item.shop_id, product_id = %product.id)
    )]
    async fn create_shop_item(&self, item: &ShopItem, product: &Product) -> Result<ShopItem> {
        let item_row = ShopItemRow::try_from(item)?;
        let product_row = ProductRow::try_from(product)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error(Operation::Transaction))?;

        if let Err(err) = Self::insert_item_with_product(&mut tx, &item_row, &product_row).await {
            warn!(error = %err, "rolling back shop item creation");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }

        tx.commit().await.map_err(db_error(Operation::Transaction))?;

        self.get_shop_item_by_id(&item.id).await
    }

    #[instrument(skip(self, item), fields(shop_item_id = %item.id))]
    async fn update_shop_item(&self, item: &ShopItem) -> Result<ShopItem> {
        let row = ShopItemRow::try_from(item)?;

        sqlx::query(
            "UPDATE shop_product SET shop_id = $2, product_id = $3, quantity = $4 WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.shop_id)
        .bind(row.product_id)
        .bind(row.quantity)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_shop_item_by_id(&item.id).await
    }

    #[instrument(skip(self), fields(shop_item_id = %id))]
    async fn delete_shop_item(&self, id: &ShopItemId) -> Result<()> {
        sqlx::query("DELETE FROM shop_product WHERE id = $1")
            .bind(to_uuid("shop item id", id)?)
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

    fn shop() -> Shop {
        Shop {
            id: ShopId::new("30e18bc1-4354-4937-9a3b-03cf0b7027b1"),
            seller_id: UserId::new("30e18bc1-4354-4937-9a3b-03cf0b7027cc"),
            name: "Apple store".to_owned(),
            description: "Phones and laptops".to_owned(),
            requisites: "40702810900000000001".to_owned(),
            email: "store@mail.ru".to_owned(),
            items: Vec::new(),
        }
    }

    #[test]
    fn test_shop_row_keeps_fields() {
        let row = ShopRow::try_from(&shop()).unwrap();
        assert_eq!(row.into_shop(Vec::new()), shop());
    }

    #[test]
    fn test_shop_row_attaches_items() {
        let item = ShopItem {
            id: ShopItemId::generate(),
            shop_id: shop().id,
            product_id: ProductId::generate(),
            quantity: 5,
        };
        let row = ShopRow::try_from(&shop()).unwrap();
        let rebuilt = row.into_shop(vec![item.clone()]);
        assert_eq!(rebuilt.items, [item]);
    }

    #[test]
    fn test_invalid_seller_id() {
        let mut shop = shop();
        shop.seller_id = UserId::new("seller");
        assert_eq!(
            ShopRow::try_from(&shop).unwrap_err().kind(),
            ErrorKind::InvalidId
        );
    }

    #[test]
    fn test_shop_item_row_round_trip() {
        let item = ShopItem {
            id: ShopItemId::generate(),
            shop_id: ShopId::generate(),
            product_id: ProductId::generate(),
            quantity: 7,
        };
        let row = ShopItemRow::try_from(&item).unwrap();
        assert_eq!(ShopItem::from(row), item);
    }
}
