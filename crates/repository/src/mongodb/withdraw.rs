//! Withdrawal repository for `MongoDB`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{RepositoryError, Result, ShopId, Withdraw, WithdrawId, WithdrawRepository};

use super::WITHDRAW;
use super::error::{mongo_error, not_found};
use crate::page::Page;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WithdrawRecord {
    #[serde(rename = "_id")]
    id: String,
    shop_id: String,
    comment: String,
    sum: i64,
    status: String,
}

impl From<&Withdraw> for WithdrawRecord {
    fn from(withdraw: &Withdraw) -> Self {
        Self {
            id: withdraw.id.as_str().to_owned(),
            shop_id: withdraw.shop_id.as_str().to_owned(),
            comment: withdraw.comment.clone(),
            sum: withdraw.sum,
            status: withdraw.status.as_str().to_owned(),
        }
    }
}

impl TryFrom<WithdrawRecord> for Withdraw {
    type Error = RepositoryError;

    fn try_from(record: WithdrawRecord) -> Result<Self> {
        Ok(Self {
            id: WithdrawId::new(record.id),
            shop_id: ShopId::new(record.shop_id),
            comment: record.comment,
            sum: record.sum,
            status: record.status.parse()?,
        })
    }
}

/// Payout requests backed by the `withdraw` collection.
#[derive(Debug, Clone)]
pub struct MongoWithdrawRepository {
    withdraws: Collection<WithdrawRecord>,
}

impl MongoWithdrawRepository {
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            withdraws: db.collection(WITHDRAW),
        }
    }

    async fn find(&self, filter: Document, page: Option<Page>) -> Result<Vec<Withdraw>> {
        let mut find = self.withdraws.find(filter).sort(doc! { "_id": 1 });
        if let Some(page) = page {
            find = find.skip(page.skip()).limit(page.limit);
        }
        let records: Vec<WithdrawRecord> = find
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        records.into_iter().map(Withdraw::try_from).collect()
    }
}

#[async_trait]
impl WithdrawRepository for MongoWithdrawRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<Withdraw>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };
        self.find(doc! {}, Some(page)).await
    }

    #[instrument(skip(self), fields(withdraw_id = %id))]
    async fn get_by_id(&self, id: &WithdrawId) -> Result<Withdraw> {
        self.withdraws
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("withdraw", id))?
            .try_into()
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn get_by_shop_id(&self, shop_id: &ShopId) -> Result<Vec<Withdraw>> {
        self.find(doc! { "shop_id": shop_id.as_str() }, None).await
    }

    #[instrument(
        skip(self, withdraw),
        fields(withdraw_id = %withdraw.id, shop_id = %withdraw.shop_id)
    )]
    async fn create(&self, withdraw: &Withdraw) -> Result<Withdraw> {
        self.withdraws
            .insert_one(WithdrawRecord::from(withdraw))
            .await
            .map_err(mongo_error(Operation::Insert))?;

        self.get_by_id(&withdraw.id).await
    }

    #[instrument(
        skip(self, withdraw),
        fields(withdraw_id = %withdraw.id, status = %withdraw.status)
    )]
    async fn update(&self, withdraw: &Withdraw) -> Result<Withdraw> {
        self.withdraws
            .replace_one(doc! { "_id": withdraw.id.as_str() }, WithdrawRecord::from(withdraw))
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_by_id(&withdraw.id).await
    }

    #[instrument(skip(self), fields(withdraw_id = %id))]
    async fn delete(&self, id: &WithdrawId) -> Result<()> {
        self.withdraws
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }
}
