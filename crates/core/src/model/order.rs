//! Customer orders.
//!
//! An order is a three-level aggregate: the customer-facing header
//! ([`OrderCustomer`]), one sub-order per shop involved ([`OrderShop`]), and
//! the product lines of each sub-order ([`OrderShopItem`]). The whole tree is
//! written in one atomic unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    OrderCustomerId, OrderShopId, OrderShopItemId, OrderShopStatus, ProductId, ShopId, UserId,
};

/// The order as seen by the customer who placed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub id: OrderCustomerId,
    pub customer_id: UserId,
    /// Delivery address.
    pub address: String,
    pub created_at: DateTime<Utc>,
    /// Total in minor currency units.
    pub total_price: i64,
    /// Set once payment has been confirmed.
    pub payed: bool,
    /// One entry per shop fulfilling part of the order.
    #[serde(default)]
    pub order_shops: Vec<OrderShop>,
}

impl OrderCustomer {
    /// Iterate every product line across all shops of the order.
    pub fn items(&self) -> impl Iterator<Item = &OrderShopItem> {
        self.order_shops
            .iter()
            .flat_map(|order_shop| order_shop.order_shop_items.iter())
    }
}

/// The part of an order fulfilled by a single shop.
///
/// `(shop_id, order_customer_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShop {
    pub id: OrderShopId,
    pub shop_id: ShopId,
    pub order_customer_id: OrderCustomerId,
    pub status: OrderShopStatus,
    /// Whether the shop has been told about this sub-order.
    pub notified: bool,
    #[serde(default)]
    pub order_shop_items: Vec<OrderShopItem>,
}

/// One product line of a shop sub-order.
///
/// `(order_shop_id, product_id)` is unique. Placing the order deducts
/// `quantity` from the matching [`ShopItem`](super::ShopItem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShopItem {
    pub id: OrderShopItemId,
    pub order_shop_id: OrderShopId,
    pub product_id: ProductId,
    pub quantity: i64,
}
