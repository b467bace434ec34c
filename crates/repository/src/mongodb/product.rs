//! Product repository for `MongoDB`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{Product, ProductId, ProductRepository, RepositoryError, Result};

use super::PRODUCT;
use super::error::{mongo_error, not_found};
use crate::page::Page;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct ProductRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub photo_url: String,
}

impl From<&Product> for ProductRecord {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_str().to_owned(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.as_str().to_owned(),
            photo_url: product.photo_url.clone(),
        }
    }
}

impl TryFrom<ProductRecord> for Product {
    type Error = RepositoryError;

    fn try_from(record: ProductRecord) -> Result<Self> {
        Ok(Self {
            id: ProductId::new(record.id),
            name: record.name,
            description: record.description,
            price: record.price,
            category: record.category.parse()?,
            photo_url: record.photo_url,
        })
    }
}

/// Catalogue products backed by the `product` collection.
#[derive(Debug, Clone)]
pub struct MongoProductRepository {
    products: Collection<ProductRecord>,
}

impl MongoProductRepository {
    /// Bind to `db`. The `product` collection has no secondary unique index.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            products: db.collection(PRODUCT),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let records: Vec<ProductRecord> = self
            .products
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .skip(page.skip())
            .limit(page.limit)
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        records.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_by_id(&self, id: &ProductId) -> Result<Product> {
        self.products
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("product", id))?
            .try_into()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create(&self, product: &Product) -> Result<Product> {
        self.products
            .insert_one(ProductRecord::from(product))
            .await
            .map_err(mongo_error(Operation::Insert))?;

        self.get_by_id(&product.id).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update(&self, product: &Product) -> Result<Product> {
        self.products
            .replace_one(doc! { "_id": product.id.as_str() }, ProductRecord::from(product))
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_by_id(&product.id).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<()> {
        self.products
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }
}
