//! User repository for `MongoDB`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, ClientSession, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use marketplace_core::{CartId, RepositoryError, Result, User, UserId, UserRepository};

use super::cart::CartRecord;
use super::error::{mongo_error, not_found};
use super::{CART, USER, begin, ensure_indexes_for, finish};
use crate::page::Page;
use crate::translate::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub cart_id: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_str().to_owned(),
            cart_id: user.cart_id.as_str().to_owned(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            role: user.role.as_str().to_owned(),
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(record: UserRecord) -> Result<Self> {
        Ok(Self {
            id: UserId::new(record.id),
            cart_id: CartId::new(record.cart_id),
            name: record.name,
            surname: record.surname,
            phone: record.phone,
            email: record.email,
            password: record.password,
            role: record.role.parse()?,
        })
    }
}

/// Users backed by the `user` and `cart` collections.
#[derive(Debug, Clone)]
pub struct MongoUserRepository {
    client: Client,
    users: Collection<UserRecord>,
    carts: Collection<CartRecord>,
}

impl MongoUserRepository {
    /// Bind to `db` and ensure the unique index on `user.email`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the index cannot be created.
    pub async fn new(db: &Database) -> mongodb::error::Result<Self> {
        ensure_indexes_for(db, &[USER]).await?;
        Ok(Self {
            client: db.client().clone(),
            users: db.collection(USER),
            carts: db.collection(CART),
        })
    }

    async fn insert_with_cart(
        &self,
        session: &mut ClientSession,
        record: &UserRecord,
    ) -> Result<()> {
        let cart = CartRecord {
            id: record.cart_id.clone(),
            price: 0,
        };
        self.carts
            .insert_one(&cart)
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Insert))?;
        debug!(cart_id = %cart.id, "cart inserted");

        self.users
            .insert_one(record)
            .session(&mut *session)
            .await
            .map_err(mongo_error(Operation::Insert))?;
        debug!(user_id = %record.id, "user inserted");

        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let records: Vec<UserRecord> = self
            .users
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .skip(page.skip())
            .limit(page.limit)
            .await
            .map_err(mongo_error(Operation::Read))?
            .try_collect()
            .await
            .map_err(mongo_error(Operation::Read))?;

        records.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: &UserId) -> Result<User> {
        self.users
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| not_found("user", id))?
            .try_into()
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User> {
        self.users
            .find_one(doc! { "email": email })
            .await
            .map_err(mongo_error(Operation::Read))?
            .ok_or_else(|| RepositoryError::NotExist(format!("no user with email {email}")))?
            .try_into()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, cart_id = %user.cart_id))]
    async fn create(&self, user: &User) -> Result<User> {
        let record = UserRecord::from(user);

        let mut session = begin(&self.client).await?;
        let outcome = self.insert_with_cart(&mut session, &record).await;
        finish(session, outcome, "user creation").await?;

        self.get_by_id(&user.id).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> Result<User> {
        let record = UserRecord::from(user);

        self.users
            .replace_one(doc! { "_id": user.id.as_str() }, &record)
            .await
            .map_err(mongo_error(Operation::Update))?;

        self.get_by_id(&user.id).await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: &UserId) -> Result<()> {
        self.users
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(mongo_error(Operation::Delete))?;
        Ok(())
    }
}
