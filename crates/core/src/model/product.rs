//! Catalogue products.

use serde::{Deserialize, Serialize};

use crate::types::{ProductCategory, ProductId};

/// A product listed by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in minor currency units.
    pub price: i64,
    pub category: ProductCategory,
    pub photo_url: String,
}
