//! Seller shops and their stock.

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ShopId, ShopItemId, UserId};

/// A shop owned by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    /// The seller (a [`User`](super::User) with the `Seller` role).
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    /// Payment requisites used for withdrawals.
    pub requisites: String,
    pub email: String,
    /// Stock lines of this shop.
    #[serde(default)]
    pub items: Vec<ShopItem>,
}

/// Stock of one product in one shop. `(shop_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: ShopItemId,
    pub shop_id: ShopId,
    pub product_id: ProductId,
    /// Units available; decremented when an order is placed.
    pub quantity: i64,
}
