//! Shop payout requests.

use serde::{Deserialize, Serialize};

use crate::types::{ShopId, WithdrawId, WithdrawStatus};

/// A request to pay out shop earnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub id: WithdrawId,
    pub shop_id: ShopId,
    pub comment: String,
    /// Amount in minor currency units.
    pub sum: i64,
    pub status: WithdrawStatus,
}
