//! Order repository for `PostgreSQL`.
//!
//! # Placing an order
//!
//! [`OrderRepository::create_order_customer`] runs in one transaction:
//!
//! 1. insert the `order_customer` header
//! 2. insert every `order_shop` row
//! 3. for every line: take the ordered quantity from the `shop_product` row
//!    stocking that product, then insert the `order_shop_product` row
//!
//! Any failure rolls the whole order back. Stock is read and written inside
//! the transaction at the database's default isolation level.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use marketplace_core::{
    OrderCustomer, OrderCustomerId, OrderRepository, OrderShop, OrderShopId, OrderShopItem,
    OrderShopItemId, ProductId, RepositoryError, Result, ShopId, UserId,
};

use super::error::{db_error, to_uuid};
use super::shop::{SHOP_ITEM_COLUMNS, ShopItemRow};
use crate::stock::remaining_stock;
use crate::translate::Operation;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct OrderCustomerRow {
    id: Uuid,
    customer_id: Uuid,
    address: String,
    created_at: DateTime<Utc>,
    total_price: i64,
    payed: bool,
}

impl OrderCustomerRow {
    fn into_order(self, order_shops: Vec<OrderShop>) -> OrderCustomer {
        OrderCustomer {
            id: OrderCustomerId::from(self.id),
            customer_id: UserId::from(self.customer_id),
            address: self.address,
            created_at: self.created_at,
            total_price: self.total_price,
            payed: self.payed,
            order_shops,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct OrderShopRow {
    id: Uuid,
    shop_id: Uuid,
    order_customer_id: Uuid,
    status: String,
    notified: bool,
}

impl OrderShopRow {
    fn into_order_shop(self, order_shop_items: Vec<OrderShopItem>) -> Result<OrderShop> {
        Ok(OrderShop {
            id: OrderShopId::from(self.id),
            shop_id: ShopId::from(self.shop_id),
            order_customer_id: OrderCustomerId::from(self.order_customer_id),
            status: self.status.parse()?,
            notified: self.notified,
            order_shop_items,
        })
    }
}

impl TryFrom<&OrderShop> for OrderShopRow {
    type Error = RepositoryError;

    fn try_from(order_shop: &OrderShop) -> Result<Self> {
        Ok(Self {
            id: to_uuid("order shop id", &order_shop.id)?,
            shop_id: to_uuid("shop id", &order_shop.shop_id)?,
            order_customer_id: to_uuid("order customer id", &order_shop.order_customer_id)?,
            status: order_shop.status.as_str().to_owned(),
            notified: order_shop.notified,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct OrderShopItemRow {
    id: Uuid,
    order_shop_id: Uuid,
    product_id: Uuid,
    quantity: i64,
}

impl From<OrderShopItemRow> for OrderShopItem {
    fn from(row: OrderShopItemRow) -> Self {
        Self {
            id: OrderShopItemId::from(row.id),
            order_shop_id: OrderShopId::from(row.order_shop_id),
            product_id: ProductId::from(row.product_id),
            quantity: row.quantity,
        }
    }
}

impl TryFrom<&OrderShopItem> for OrderShopItemRow {
    type Error = RepositoryError;

    fn try_from(item: &OrderShopItem) -> Result<Self> {
        Ok(Self {
            id: to_uuid("order shop item id", &item.id)?,
            order_shop_id: to_uuid("order shop id", &item.order_shop_id)?,
            product_id: to_uuid("product id", &item.product_id)?,
            quantity: item.quantity,
        })
    }
}

/// The flattened rows of one order tree, in insertion order.
#[derive(Debug)]
struct OrderRows {
    header: OrderCustomerRow,
    shops: Vec<OrderShopRow>,
    items: Vec<OrderShopItemRow>,
}

impl TryFrom<&OrderCustomer> for OrderRows {
    type Error = RepositoryError;

    fn try_from(order: &OrderCustomer) -> Result<Self> {
        let header = OrderCustomerRow {
            id: to_uuid("order customer id", &order.id)?,
            customer_id: to_uuid("customer id", &order.customer_id)?,
            address: order.address.clone(),
            created_at: order.created_at,
            total_price: order.total_price,
            payed: order.payed,
        };
        let shops = order
            .order_shops
            .iter()
            .map(OrderShopRow::try_from)
            .collect::<Result<_>>()?;
        let items = order
            .items()
            .map(OrderShopItemRow::try_from)
            .collect::<Result<_>>()?;

        Ok(Self {
            header,
            shops,
            items,
        })
    }
}

const ORDER_CUSTOMER_COLUMNS: &str = "id, customer_id, address, created_at, total_price, payed";
const ORDER_SHOP_COLUMNS: &str = "id, shop_id, order_customer_id, status, notified";
const ORDER_SHOP_ITEM_COLUMNS: &str = "id, order_shop_id, product_id, quantity";

// =============================================================================
// Transaction Steps
// =============================================================================

async fn insert_header(conn: &mut PgConnection, row: &OrderCustomerRow) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO order_customer ({ORDER_CUSTOMER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(row.id)
    .bind(row.customer_id)
    .bind(&row.address)
    .bind(row.created_at)
    .bind(row.total_price)
    .bind(row.payed)
    .execute(conn)
    .await
    .map_err(db_error(Operation::Insert))?;
    Ok(())
}

async fn insert_order_shop(conn: &mut PgConnection, row: &OrderShopRow) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO order_shop ({ORDER_SHOP_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
    ))
    .bind(row.id)
    .bind(row.shop_id)
    .bind(row.order_customer_id)
    .bind(&row.status)
    .bind(row.notified)
    .execute(conn)
    .await
    .map_err(db_error(Operation::Insert))?;
    Ok(())
}

async fn insert_order_shop_item(conn: &mut PgConnection, row: &OrderShopItemRow) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO order_shop_product ({ORDER_SHOP_ITEM_COLUMNS}) VALUES ($1, $2, $3, $4)"
    ))
    .bind(row.id)
    .bind(row.order_shop_id)
    .bind(row.product_id)
    .bind(row.quantity)
    .execute(conn)
    .await
    .map_err(db_error(Operation::Insert))?;
    Ok(())
}

/// Deduct an order line from the shop item stocking its product.
async fn take_stock(conn: &mut PgConnection, line: &OrderShopItemRow) -> Result<()> {
    let stock = sqlx::query_as::<_, ShopItemRow>(&format!(
        "SELECT {SHOP_ITEM_COLUMNS} FROM shop_product WHERE product_id = $1 ORDER BY id LIMIT 1"
    ))
    .bind(line.product_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error(Operation::Read))?;

    let remaining = remaining_stock(stock.quantity, line.quantity).ok_or_else(|| {
        RepositoryError::InsufficientStock(format!(
            "shop item {} holds {} of product {}, order line {} needs {}",
            stock.id, stock.quantity, line.product_id, line.id, line.quantity
        ))
    })?;

    sqlx::query("UPDATE shop_product SET quantity = $2 WHERE id = $1")
        .bind(stock.id)
        .bind(remaining)
        .execute(&mut *conn)
        .await
        .map_err(db_error(Operation::Update))?;
    debug!(shop_item_id = %stock.id, remaining, "stock taken");

    Ok(())
}

async fn insert_order(conn: &mut PgConnection, rows: &OrderRows) -> Result<()> {
    insert_header(&mut *conn, &rows.header).await?;
    debug!(order_customer_id = %rows.header.id, "order header inserted");

    for shop in &rows.shops {
        insert_order_shop(&mut *conn, shop).await?;
        debug!(order_shop_id = %shop.id, shop_id = %shop.shop_id, "order shop inserted");
    }

    for line in &rows.items {
        take_stock(&mut *conn, line).await?;
        insert_order_shop_item(&mut *conn, line).await?;
        debug!(order_shop_item_id = %line.id, "order line inserted");
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Orders backed by `order_customer`, `order_shop` and `order_shop_product`.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lines_of(&self, order_shop_id: Uuid) -> Result<Vec<OrderShopItem>> {
        let rows = sqlx::query_as::<_, OrderShopItemRow>(&format!(
            "SELECT {ORDER_SHOP_ITEM_COLUMNS} FROM order_shop_product \
             WHERE order_shop_id = $1 ORDER BY id"
        ))
        .bind(order_shop_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        Ok(rows.into_iter().map(OrderShopItem::from).collect())
    }

    async fn with_lines(&self, rows: Vec<OrderShopRow>) -> Result<Vec<OrderShop>> {
        let mut order_shops = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.lines_of(row.id).await?;
            order_shops.push(row.into_order_shop(lines)?);
        }
        Ok(order_shops)
    }

    async fn assemble(&self, header: OrderCustomerRow) -> Result<OrderCustomer> {
        let rows = sqlx::query_as::<_, OrderShopRow>(&format!(
            "SELECT {ORDER_SHOP_COLUMNS} FROM order_shop WHERE order_customer_id = $1 ORDER BY id"
        ))
        .bind(header.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        let order_shops = self.with_lines(rows).await?;
        Ok(header.into_order(order_shops))
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_order_customers_by_customer_id(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<OrderCustomer>> {
        let headers = sqlx::query_as::<_, OrderCustomerRow>(&format!(
            "SELECT {ORDER_CUSTOMER_COLUMNS} FROM order_customer WHERE customer_id = $1 ORDER BY id"
        ))
        .bind(to_uuid("customer id", customer_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            orders.push(self.assemble(header).await?);
        }
        Ok(orders)
    }

    #[instrument(skip(self), fields(order_customer_id = %id))]
    async fn get_order_customer_by_id(&self, id: &OrderCustomerId) -> Result<OrderCustomer> {
        let header = sqlx::query_as::<_, OrderCustomerRow>(&format!(
            "SELECT {ORDER_CUSTOMER_COLUMNS} FROM order_customer WHERE id = $1"
        ))
        .bind(to_uuid("order customer id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        self.assemble(header).await
    }

    #[instrument(skip(self), fields(order_shop_id = %id))]
    async fn get_order_shop_by_id(&self, id: &OrderShopId) -> Result<OrderShop> {
        let row = sqlx::query_as::<_, OrderShopRow>(&format!(
            "SELECT {ORDER_SHOP_COLUMNS} FROM order_shop WHERE id = $1"
        ))
        .bind(to_uuid("order shop id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        let lines = self.lines_of(row.id).await?;
        row.into_order_shop(lines)
    }

    #[instrument(skip(self))]
    async fn get_unnotified_order_shops(&self) -> Result<Vec<OrderShop>> {
        let rows = sqlx::query_as::<_, OrderShopRow>(&format!(
            "SELECT {ORDER_SHOP_COLUMNS} FROM order_shop WHERE NOT notified ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        self.with_lines(rows).await
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn get_order_shops_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<OrderShop>> {
        let rows = sqlx::query_as::<_, OrderShopRow>(&format!(
            "SELECT {ORDER_SHOP_COLUMNS} FROM order_shop WHERE shop_id = $1 ORDER BY id"
        ))
        .bind(to_uuid("shop id", shop_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        self.with_lines(rows).await
    }

    #[instrument(
        skip(self, order),
        fields(order_customer_id = %order.id, shops = order.order_shops.len())
    )]
    async fn create_order_customer(&self, order: &OrderCustomer) -> Result<OrderCustomer> {
        let rows = OrderRows::try_from(order)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error(Operation::Transaction))?;

        if let Err(err) = insert_order(&mut tx, &rows).await {
            warn!(error = %err, "rolling back order creation");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }

        tx.commit().await.map_err(db_error(Operation::Transaction))?;

        self.get_order_customer_by_id(&order.id).await
    }

    #[instrument(
        skip(self, order_shop),
        fields(order_shop_id = %order_shop.id, status = %order_shop.status)
    )]
    async fn update_order_shop(&self, order_shop: &OrderShop) -> Result<OrderShop> {
        let row = OrderShopRow::try_from(order_shop)?;

        sqlx::query(
            r"
            UPDATE order_shop
            SET shop_id = $2, order_customer_id = $3, status = $4, notified = $5
            WHERE id = $1
            ",
        )
        .bind(row.id)
        .bind(row.shop_id)
        .bind(row.order_customer_id)
        .bind(&row.status)
        .bind(row.notified)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_order_shop_by_id(&order_shop.id).await
    }

    #[instrument(skip(self), fields(order_customer_id = %id))]
    async fn update_payment_status(&self, id: &OrderCustomerId) -> Result<()> {
        let result = sqlx::query("UPDATE order_customer SET payed = TRUE WHERE id = $1")
            .bind(to_uuid("order customer id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Update))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotExist(format!("order customer {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use marketplace_core::{ErrorKind, OrderShopStatus};

    use super::*;

    fn order() -> OrderCustomer {
        let order_id = OrderCustomerId::new("30e18bc1-4354-4937-9a3b-03cf0b702ae1");
        let order_shop_id = OrderShopId::new("30e18bc1-4354-4937-9a3b-03cf0b702ee1");
        OrderCustomer {
            id: order_id.clone(),
            customer_id: UserId::new("30e18bc1-4354-4937-9a3b-03cf0b7027cc"),
            address: "Pushkina 1-2-3".to_owned(),
            created_at: Utc.with_ymd_and_hms(2022, 10, 10, 11, 30, 30).unwrap(),
            total_price: 1200,
            payed: false,
            order_shops: vec![OrderShop {
                id: order_shop_id.clone(),
                shop_id: ShopId::new("30e18bc1-4354-4937-9a3b-03cf0b7027b1"),
                order_customer_id: order_id,
                status: OrderShopStatus::Start,
                notified: false,
                order_shop_items: vec![OrderShopItem {
                    id: OrderShopItemId::new("30e18bc1-4354-4937-9a3b-03cf0b70eee1"),
                    order_shop_id,
                    product_id: ProductId::new("30e18bc1-4354-4937-9a3b-03cf0b7027a1"),
                    quantity: 1,
                }],
            }],
        }
    }

    #[test]
    fn test_order_rows_flatten_tree() {
        let rows = OrderRows::try_from(&order()).unwrap();
        assert_eq!(rows.header.address, "Pushkina 1-2-3");
        assert_eq!(rows.shops.len(), 1);
        assert_eq!(rows.shops[0].status, "Start");
        assert_eq!(rows.items.len(), 1);
        assert_eq!(rows.items[0].order_shop_id, rows.shops[0].id);
    }

    #[test]
    fn test_order_rows_reassemble() {
        let original = order();
        let rows = OrderRows::try_from(&original).unwrap();
        let lines: Vec<OrderShopItem> = rows.items.into_iter().map(OrderShopItem::from).collect();
        let shop = rows
            .shops
            .into_iter()
            .next()
            .unwrap()
            .into_order_shop(lines)
            .unwrap();
        assert_eq!(rows.header.into_order(vec![shop]), original);
    }

    #[test]
    fn test_bad_nested_id_fails_whole_tree() {
        let mut order = order();
        order.order_shops[0].order_shop_items[0].product_id = ProductId::new("phone");
        assert_eq!(
            OrderRows::try_from(&order).unwrap_err().kind(),
            ErrorKind::InvalidId
        );
    }

    #[test]
    fn test_unknown_status_is_data_corruption() {
        let mut row = OrderShopRow::try_from(&order().order_shops[0]).unwrap();
        row.status = "Shipped".to_owned();
        assert_eq!(
            row.into_order_shop(Vec::new()).unwrap_err().kind(),
            ErrorKind::DataCorruption
        );
    }
}
