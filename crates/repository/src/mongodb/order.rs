//! Order repository for `MongoDB`.
//!
//! Placing an order writes the header, every shop sub-order, and every line
//! in one transaction, deducting each line's quantity from the `shop_product`
//! document stocking that product on the way.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::{Client, ClientSession, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use marketplace_core::{
    OrderCustomer, OrderCustomerId, OrderRepository, OrderShop, OrderShopId, OrderShopItem,
    OrderShopItemId, ProductId, RepositoryError, Result, ShopId, UserId,
};

use super::error::{from_bson_datetime, mongo_error, not_found, to_bson_datetime};
use super::shop::ShopItemRecord;
use super::{
    ORDER_CUSTOMER, ORDER_SHOP, ORDER_SHOP_PRODUCT, SHOP_PRODUCT, begin, ensure_indexes_for,
    finish,
};
use crate::stock::remaining_stock;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OrderCustomerRecord {
    #[serde(rename = "_id")]
    id: String,
    customer_id: String,
    address: String,
    created_at: bson::DateTime,
    total_price: i64,
    payed: bool,
}

impl From<&OrderCustomer> for OrderCustomerRecord {
    fn from(order: &OrderCustomer) -> Self {
        Self {
            id: order.id.as_str().to_owned(),
            customer_id: order.customer_id.as_str().to_owned(),
            address: order.address.clone(),
            created_at: to_bson_datetime(order.created_at),
            total_price: order.total_price,
            payed: order.payed,
        }
    }
}

impl OrderCustomerRecord {
    fn into_order(self, order_shops: Vec<OrderShop>) -> Result<OrderCustomer> {
        Ok(OrderCustomer {
            id: OrderCustomerId::new(self.id),
            customer_id: UserId::new(self.customer_id),
            address: self.address,
            created_at: from_bson_datetime(self.created_at)?,
            total_price: self.total_price,
            payed: self.payed,
            order_shops,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OrderShopRecord {
    #[serde(rename = "_id")]
    id: String,
    shop_id: String,
    order_customer_id: String,
    status: String,
    notified: bool,
}

impl From<&OrderShop> for OrderShopRecord {
    fn from(order_shop: &OrderShop) -> Self {
        Self {
            id: order_shop.id.as_str().to_owned(),
            shop_id: order_shop.shop_id.as_str().to_owned(),
            order_customer_id: order_shop.order_customer_id.as_str().to_owned(),
            status: order_shop.status.as_str().to_owned(),
            notified: order_shop.notified,
        }
    }
}

impl OrderShopRecord {
    fn into_order_shop(self, order_shop_items: Vec<OrderShopItem>) -> Result<OrderShop> {
        Ok(OrderShop {
            id: OrderShopId::new(self.id),
            shop_id: ShopId::new(self.shop_id),
            order_customer_id: OrderCustomerId::new(self.order_customer_id),
            status: self.status.parse()?,
            notified: self.notified,
            order_shop_items,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OrderShopItemRecord {
    #[serde(rename = "_id")]
    id: String,
    order_shop_id: String,
    product_id: String,
    quantity: i64,
}

impl From<&OrderShopItem> for OrderShopItemRecord {
    fn from(item: &OrderShopItem) -> Self {
        Self {
            id: item.id.as_str().to_owned(),
            order_shop_id: item.order_shop_id.as_str().to_owned(),
            product_id: item.product_id.as_str().to_owned(),
            quantity: item.quantity,
        }
    }
}

impl From<OrderShopItemRecord> for OrderShopItem {
    fn from(record: OrderShopItemRecord) -> Self {
        Self {
            id: OrderShopItemId::new(record.id),
            order_shop_id: OrderShopId::new(record.order_shop_id),
            product_id: ProductId::new(record.product_id),
            quantity: record.quantity,
        }
    }
}

/// Orders backed by `order_customer`, `order_shop` and `order_shop_product`.
#[derive(Debug, Clone)]
pub struct MongoOrderRepository {
    client: Client,
    orders: Collection<OrderCustomerRecord>,
    order_shops: Collection<OrderShopRecord>,
    lines: Collection<OrderShopItemRecord>,
    stock: Collection<ShopItemRecord>,
}

impl MongoOrderRepository {
    /// Bind to `db` and ensure the unique indexes on `order_shop` and
    /// `order_shop_product`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if an index cannot be created.
    pub async fn new(db: &Database) -> mongodb::error::Result<Self> {
        ensure_indexes_for(db, &[ORDER_SHOP, ORDER_SHOP_PRODUCT]).await?;
        Ok(Self {
            client: db.client().clone(),
            orders: db.collection(ORDER_CUSTOMER),
            order_shops: db.collection(ORDER_SHOP),
            lines: db.collection(ORDER_SHOP_PRODUCT),
            stock: db.collection(SHOP_PRODUCT),
        })
    }

    async fn lines_of(&self, order_shop_id: &str) -> Result<Vec<OrderShopItem>> {
        let records: Vec<OrderShopItemRecord> = self
            .lines
            .find(doc! { "order_shop_id": order_shop_id })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        Ok(records.into_iter().map(OrderShopItem::from).collect())
    }

    async fn find_order_shops(&self, filter: Document) -> Result<Vec<OrderShop>> {
        let records: Vec<OrderShopRecord> = self
            .order_shops
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        let mut order_shops = Vec::with_capacity(records.len());
        for record in records {
            let lines = self.lines_of(&record.id).await?;
            order_shops.push(record.into_order_shop(lines)?);
        }
        Ok(order_shops)
    }

    async fn assemble(&self, header: OrderCustomerRecord) -> Result<OrderCustomer> {
        let order_shops = self
            .find_order_shops(doc! { "order_customer_id": header.id.as_str() })
            .await?;
        header.into_order(order_shops)
    }

    /// Deduct an order line from the shop item stocking its product.
    async fn take_stock(
        &self,
        session: &mut ClientSession,
        line: &OrderShopItemRecord,
    ) -> Result<()> {
        let stock = self
            .stock
            .find_one(doc! { "product_id": line.product_id.as_str() })
            .sort(doc! { "_id": 1 })
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| {
                RepositoryError::NotExist(format!(
                    "no shop item stocks product {}",
                    line.product_id
                ))
            })?;

        let remaining = remaining_stock(stock.quantity, line.quantity).ok_or_else(|| {
            RepositoryError::InsufficientStock(format!(
                "shop item {} holds {} of product {}, order line {} needs {}",
                stock.id, stock.quantity, line.product_id, line.id, line.quantity
            ))
        })?;

        self.stock
            .update_one(
                doc! { "_id": stock.id.as_str() },
                doc! { "$set": { "quantity": remaining } },
            )
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Update))?;
        debug!(shop_item_id = %stock.id, remaining, "stock taken");

        Ok(())
    }

    async fn insert_order(&self, session: &mut ClientSession, order: &OrderCustomer) -> Result<()> {
        self.orders
            .insert_one(OrderCustomerRecord::from(order))
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Insert))?;
        debug!(order_customer_id = %order.id, "order header inserted");

        for order_shop in &order.order_shops {
            self.order_shops
                .insert_one(OrderShopRecord::from(order_shop))
                .session(&mut *session)
                .await
                .map_err(mongo_error(Operation::Insert))?;
            debug!(
                order_shop_id = %order_shop.id,
                shop_id = %order_shop.shop_id,
                "order shop inserted"
            );
        }

        for line in order.items().map(OrderShopItemRecord::from) {
            self.take_stock(session, &line).await?;
            self.lines
                .insert_one(&line)
                .session(&mut *session)
                .await
                .map_err(mongo_error(Operation::Insert))?;
            debug!(order_shop_item_id = %line.id, "order line inserted");
        }

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_order_customers_by_customer_id(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<OrderCustomer>> {
        let headers: Vec<OrderCustomerRecord> = self
            .orders
            .find(doc! { "customer_id": customer_id.as_str() })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            orders.push(self.assemble(header).await?);
        }
        Ok(orders)
    }

    #[instrument(skip(self), fields(order_customer_id = %id))]
    async fn get_order_customer_by_id(&self, id: &OrderCustomerId) -> Result<OrderCustomer> {
        let header = self
            .orders
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("order customer", id))?;

        self.assemble(header).await
    }

    #[instrument(skip(self), fields(order_shop_id = %id))]
    async fn get_order_shop_by_id(&self, id: &OrderShopId) -> Result<OrderShop> {
        let record = self
            .order_shops
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("order shop", id))?;

        let lines = self.lines_of(&record.id).await?;
        record.into_order_shop(lines)
    }

    #[instrument(skip(self))]
    async fn get_unnotified_order_shops(&self) -> Result<Vec<OrderShop>> {
        self.find_order_shops(doc! { "notified": false }).await
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn get_order_shops_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<OrderShop>> {
        self.find_order_shops(doc! { "shop_id": shop_id.as_str() })
            .await
    }

    #[instrument(
        skip(self, order),
        fields(order_customer_id = %order.id, shops = order.order_shops.len())
    )]
    async fn create_order_customer(&self, order: &OrderCustomer) -> Result<OrderCustomer> {
        let mut session = begin(&self.client).await?;
        let outcome = self.insert_order(&mut session, order).await;
        finish(session, outcome, "order creation").await?;

        self.get_order_customer_by_id(&order.id).await
    }

    #[instrument(
        skip(self, order_shop),
        fields(order_shop_id = %order_shop.id, status = %order_shop.status)
    )]
    async fn update_order_shop(&self, order_shop: &OrderShop) -> Result<OrderShop> {
        self.order_shops
            .replace_one(
                doc! { "_id": order_shop.id.as_str() },
                OrderShopRecord::from(order_shop),
            )
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_order_shop_by_id(&order_shop.id).await
    }

    #[instrument(skip(self), fields(order_customer_id = %id))]
    async fn update_payment_status(&self, id: &OrderCustomerId) -> Result<()> {
        let result = self
            .orders
            .update_one(doc! { "_id": id.as_str() }, doc! { "$set": { "payed": true } })
            .await
            .map_err(mongo_error(Operation::Update))?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotExist(format!("order customer {id}")));
        }
        Ok(())
    }
}
