//! Withdrawal repository for `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use marketplace_core::{RepositoryError, Result, ShopId, Withdraw, WithdrawId, WithdrawRepository};

use super::error::{db_error, to_uuid};
use crate::page::Page;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
struct WithdrawRow {
    id: Uuid,
    shop_id: Uuid,
    comment: String,
    sum: i64,
    status: String,
}

impl TryFrom<WithdrawRow> for Withdraw {
    type Error = RepositoryError;

    fn try_from(row: WithdrawRow) -> Result<Self> {
        Ok(Self {
            id: WithdrawId::from(row.id),
            shop_id: ShopId::from(row.shop_id),
            comment: row.comment,
            sum: row.sum,
            status: row.status.parse()?,
        })
    }
}

impl TryFrom<&Withdraw> for WithdrawRow {
    type Error = RepositoryError;

    fn try_from(withdraw: &Withdraw) -> Result<Self> {
        Ok(Self {
            id: to_uuid("withdraw id", &withdraw.id)?,
            shop_id: to_uuid("shop id", &withdraw.shop_id)?,
            comment: withdraw.comment.clone(),
            sum: withdraw.sum,
            status: withdraw.status.as_str().to_owned(),
        })
    }
}

/// Payout requests backed by the `withdraw` table.
#[derive(Debug, Clone)]
pub struct PgWithdrawRepository {
    pool: PgPool,
}

impl PgWithdrawRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WithdrawRepository for PgWithdrawRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Withdraw>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, WithdrawRow>(
            "SELECT id, shop_id, comment, sum, status FROM withdraw ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        rows.into_iter().map(Withdraw::try_from).collect()
    }

    #[instrument(skip(self), fields(withdraw_id = %id))]
    async fn get_by_id(&self, id: &WithdrawId) -> Result<Withdraw> {
        let row = sqlx::query_as::<_, WithdrawRow>(
            "SELECT id, shop_id, comment, sum, status FROM withdraw WHERE id = $1",
        )
        .bind(to_uuid("withdraw id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        row.try_into()
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn get_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<Withdraw>> {
        let rows = sqlx::query_as::<_, WithdrawRow>(
            "SELECT id, shop_id, comment, sum, status FROM withdraw WHERE shop_id = $1 ORDER BY id",
        )
        .bind(to_uuid("shop id", shop_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        rows.into_iter().map(Withdraw::try_from).collect()
    }

    #[instrument(
        skip(self, withdraw),
        fields(withdraw_id = %withdraw.id, shop_id = %withdraw.shop_id)
    )]
    async fn create(&self, withdraw: &Withdraw) -> Result<Withdraw> {
        let row = WithdrawRow::try_from(withdraw)?;

        sqlx::query(
            "INSERT INTO withdraw (id, shop_id, comment, sum, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.id)
        .bind(row.shop_id)
        .bind(&row.comment)
        .bind(row.sum)
        .bind(&row.status)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Insert))?;

        self.get_by_id(&withdraw.id).await
    }

    #[instrument(
        skip(self, withdraw),
        fields(withdraw_id = %withdraw.id, status = %withdraw.status)
    )]
    async fn update(&self, withdraw: &Withdraw) -> Result<Withdraw> {
        let row = WithdrawRow::try_from(withdraw)?;

        sqlx::query(
            "UPDATE withdraw SET shop_id = $2, comment = $3, sum = $4, status = $5 WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.shop_id)
        .bind(&row.comment)
        .bind(row.sum)
        .bind(&row.status)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_by_id(&withdraw.id).await
    }

    #[instrument(skip(self), fields(withdraw_id = %id))]
    async fn delete(&self, id: &WithdrawId) -> Result<()> {
        sqlx::query("DELETE FROM withdraw WHERE id = $1")
            .bind(to_uuid("withdraw id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{ErrorKind, WithdrawStatus};

    use super::*;

    #[test]
    fn test_status_literal() {
        let withdraw = Withdraw {
            id: WithdrawId::generate(),
            shop_id: ShopId::generate(),
            comment: "monthly payout".to_owned(),
            sum: 10_000,
            status: WithdrawStatus::Ready,
        };
        let row = WithdrawRow::try_from(&withdraw).unwrap();
        assert_eq!(row.status, "Ready");
        assert_eq!(Withdraw::try_from(row).unwrap(), withdraw);
    }

    #[test]
    fn test_lowercase_status_rejected() {
        let row = WithdrawRow {
            id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            comment: String::new(),
            sum: 0,
            status: "done".to_owned(),
        };
        assert_eq!(
            Withdraw::try_from(row).unwrap_err().kind(),
            ErrorKind::DataCorruption
        );
    }
}
