//! User repository for `PostgreSQL`.
//!
//! Creating a user also creates its empty cart in the same transaction.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use marketplace_core::{CartId, RepositoryError, Result, User, UserId, UserRepository};

use super::error::{db_error, to_uuid};
use crate::page::Page;
use crate::translate::Operation;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: UserId::from(row.id),
            cart_id: CartId::from(row.cart_id),
            name: row.name,
            surname: row.surname,
            phone: row.phone,
            email: row.email,
            password: row.password,
            role: row.role.parse()?,
        })
    }
}

impl TryFrom<&User> for UserRow {
    type Error = RepositoryError;

    fn try_from(user: &User) -> Result<Self> {
        Ok(Self {
            id: to_uuid("user id", &user.id)?,
            cart_id: to_uuid("cart id", &user.cart_id)?,
            name: user.name.clone(),
            surname: user.surname.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            role: user.role.as_str().to_owned(),
        })
    }
}

const USER_COLUMNS: &str = "id, cart_id, name, surname, phone, email, password, role";

// =============================================================================
// Repository
// =============================================================================

/// Users backed by the `"user"` and `cart` tables.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_with_cart(conn: &mut PgConnection, row: &UserRow) -> Result<()> {
        sqlx::query("INSERT INTO cart (id, price) VALUES ($1, 0)")
            .bind(row.cart_id)
            .execute(&mut *conn)
            .await
            .map_err(db_error(Operation::Insert))?;
        debug!(cart_id = %row.cart_id, "cart inserted");

        sqlx::query(
            r#"
            INSERT INTO "user" (id, cart_id, name, surname, phone, email, password, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.id)
        .bind(row.cart_id)
        .bind(&row.name)
        .bind(&row.surname)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.password)
        .bind(&row.role)
        .execute(&mut *conn)
        .await
        .map_err(db_error(Operation::Insert))?;
        debug!(user_id = %row.id, "user inserted");

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn get(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" ORDER BY id LIMIT $1 OFFSET $2"#
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: &UserId) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE id = $1"#
        ))
        .bind(to_uuid("user id", id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error(Operation::Read))?;

        row.try_into()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, cart_id = %user.cart_id))]
    async fn create(&self, user: &User) -> Result<User> {
        let row = UserRow::try_from(user)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error(Operation::Transaction))?;

        if let Err(err) = Self::insert_with_cart(&mut tx, &row).await {
            warn!(error = %err, "rolling back user creation");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            return Err(err);
        }

        tx.commit().await.map_err(db_error(Operation::Transaction))?;

        self.get_by_id(&user.id).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> Result<User> {
        let row = UserRow::try_from(user)?;

        sqlx::query(
            r#"
            UPDATE "user"
            SET cart_id = $2, name = $3, surname = $4, phone = $5,
                email = $6, password = $7, role = $8
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(row.cart_id)
        .bind(&row.name)
        .bind(&row.surname)
        .bind(&row.phone)
        .bind(&row.email)
        .bind(&row.password)
        .bind(&row.role)
        .execute(&self.pool)
        .await
        .map_err(db_error(Operation::Update))?;

        self.get_by_id(&user.id).await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: &UserId) -> Result<()> {
        sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(to_uuid("user id", id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(Operation::Delete))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{ErrorKind, UserRole};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new("30e18bc1-4354-4937-9a3b-03cf0b7027cc"),
            cart_id: CartId::new("30e18bc1-4354-4937-9a3b-03cf0b7034cc"),
            name: "Ivan".to_owned(),
            surname: "Ivanov".to_owned(),
            phone: None,
            email: "ivan@mail.ru".to_owned(),
            password: "12345".to_owned(),
            role: UserRole::Seller,
        }
    }

    #[test]
    fn test_row_round_trip() {
        let row = UserRow::try_from(&user()).unwrap();
        assert_eq!(row.role, "Seller");
        assert_eq!(User::try_from(row).unwrap(), user());
    }

    #[test]
    fn test_invalid_cart_id_rejected() {
        let mut user = user();
        user.cart_id = CartId::new("cart-1");
        let err = UserRow::try_from(&user).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidId);
    }

    #[test]
    fn test_unknown_role_is_data_corruption() {
        let mut row = UserRow::try_from(&user()).unwrap();
        row.role = "Admin".to_owned();
        let err = User::try_from(row).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorruption);
    }
}
