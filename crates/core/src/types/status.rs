//! Roles and status enums for marketplace entities.
//!
//! Every enum here is persisted as a fixed string literal (`"Customer"`,
//! `"Start"`, ...). The lookup table is exhaustive in both directions: an
//! unknown literal is reported as [`UnknownVariant`] instead of silently
//! decoding to a default value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored literal did not match any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    /// Name of the enum that failed to decode.
    pub kind: &'static str,
    /// The literal that was read from storage.
    pub value: String,
}

/// Defines `as_str`, `Display` and `FromStr` from one literal table.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $literal:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The literal stored for this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $literal),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::status::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($literal => Ok(Self::$variant),)+
                    _ => Err($crate::types::status::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

/// Role of a marketplace user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    /// Buys products and places orders.
    #[default]
    Customer,
    /// Owns shops and sells products.
    Seller,
    /// Reviews shops and withdrawals.
    Moderator,
}

string_enum!(UserRole {
    Customer => "Customer",
    Seller => "Seller",
    Moderator => "Moderator",
});

/// Fulfilment status of the part of an order handled by one shop.
///
/// Progresses `Start -> Ready -> Done`. Transitions are decided by the
/// caller; the repository only persists the value it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderShopStatus {
    #[default]
    Start,
    Ready,
    Done,
}

string_enum!(OrderShopStatus {
    Start => "Start",
    Ready => "Ready",
    Done => "Done",
});

/// Processing status of a shop payout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WithdrawStatus {
    #[default]
    Start,
    Ready,
    Done,
}

string_enum!(WithdrawStatus {
    Start => "Start",
    Ready => "Ready",
    Done => "Done",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_literals() {
        assert_eq!(UserRole::Customer.as_str(), "Customer");
        assert_eq!(UserRole::Seller.as_str(), "Seller");
        assert_eq!(UserRole::Moderator.as_str(), "Moderator");
    }

    #[test]
    fn test_every_variant_parses_back() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        for status in OrderShopStatus::ALL {
            assert_eq!(
                status.to_string().parse::<OrderShopStatus>().unwrap(),
                *status
            );
        }
        for status in WithdrawStatus::ALL {
            assert_eq!(
                status.to_string().parse::<WithdrawStatus>().unwrap(),
                *status
            );
        }
    }

    #[test]
    fn test_unknown_literal_is_an_error() {
        let err = "Admin".parse::<UserRole>().unwrap_err();
        assert_eq!(err.kind, "UserRole");
        assert_eq!(err.value, "Admin");
        assert_eq!(err.to_string(), "unknown UserRole value: \"Admin\"");
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        assert!("start".parse::<OrderShopStatus>().is_err());
        assert!("DONE".parse::<WithdrawStatus>().is_err());
    }
}
