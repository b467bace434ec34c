//! Marketplace users.

use serde::{Deserialize, Serialize};

use crate::types::{CartId, UserId, UserRole};

/// A registered user.
///
/// Every user owns exactly one [`Cart`](super::Cart), created in the same
/// atomic unit as the user itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// The cart created together with this user.
    pub cart_id: CartId,
    pub name: String,
    pub surname: String,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Login email, unique across all users.
    pub email: String,
    /// Password hash, opaque to the repository layer.
    pub password: String,
    pub role: UserRole,
}
