//! Product repository for `PostgreSQL`.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use marketplace_core::{Product, ProductId, ProductRepository, RepositoryError, Result};

use super::error::{db_error, to_uuid};
use crate::page::Page;
use crate::translate::Operation;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub(super) struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub photo_url: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Self {
            id: ProductId::from(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category.parse()?,
            photo_url: row.photo_url,
        })
    }
}

impl TryFrom<&Product> for ProductRow {
    type Error = RepositoryError;

    fn try_from(product: &Product) -> Result<Self> {
        Ok(Self {
            id: to_uuid("product id", &product.id)?,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.as_str().to_owned(),
            photo_url: product.photo_url.clone(),
        })
    }
}

/// Insert a product row on any connection, pooled or transactional.
pub(super) async fn insert_product(conn: &mut PgConnection, row: &ProductRow) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO product (id, name, description, price, category, photo_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(row.price)
    .bind(&row.category)
    .bind(&row.photo_url)
    .execute(conn)
    .await
    .map_err(db_error(Operation::Insert))?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Catalogue products backed by the `product` table.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, category, photo_url
            FROM product
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_by_id(&self, id: &ProductId) -> Result<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price, category, photo_url FROM product WHERE id = $1",
        )
        .bind(to_uuid("product id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        row.try_into()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create(&self, product: &Product) -> Result<Product> {
        let row = ProductRow::try_from(product)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error(Operation::Insert))?;
        insert_product(&mut conn, &row).await?;
        drop(conn);

        self.get_by_id(&product.id).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update(&self, product: &Product) -> Result<Product> {
        let row = ProductRow::try_from(product)?;

        sqlx::query(
            r"
            UPDATE product
            SET name = $2, description = $3, price = $4, category = $5, photo_url = $6
            WHERE id = $1
            ",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(row.price)
        .bind(&row.category)
        .bind(&row.photo_url)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_by_id(&product.id).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<()> {
        sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(to_uuid("product id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }
}
