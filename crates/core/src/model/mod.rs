//! Marketplace aggregates.
//!
//! Each aggregate is a parent entity plus the children it owns and that are
//! fetched together with it. Backends never expose their record shapes; they
//! convert to and from these structs.

pub mod cart;
pub mod order;
pub mod product;
pub mod shop;
pub mod user;
pub mod withdraw;

pub use cart::{Cart, CartItem};
pub use order::{OrderCustomer, OrderShop, OrderShopItem};
pub use product::Product;
pub use shop::{Shop, ShopItem};
pub use user::User;
pub use withdraw::Withdraw;
