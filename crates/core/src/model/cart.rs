//! Shopping carts.

use serde::{Deserialize, Serialize};

use crate::types::{CartId, CartItemId, ProductId};

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    /// Running total maintained by the caller; never recomputed here.
    pub price: i64,
    /// Items currently in the cart.
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart with a zero total, as created alongside a new user.
    #[must_use]
    pub const fn empty(id: CartId) -> Self {
        Self {
            id,
            price: 0,
            items: Vec::new(),
        }
    }
}

/// A product line in a cart. `(cart_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}
