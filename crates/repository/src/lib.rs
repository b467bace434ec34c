//! Marketplace Repository - storage backends for the marketplace domain.
//!
//! Implements the repository traits from `marketplace-core` twice:
//! - [`postgres`] - `PostgreSQL` through `sqlx`, schema in `migrations/`
//! - [`mongodb`] - `MongoDB` through the official driver
//!
//! Both backends share the same observable behavior: the same error kinds,
//! the same pagination order, and the same all-or-nothing composite writes
//! (user with cart, shop item with product, order tree with stock deduction).
//!
//! [`Repositories::connect`] picks a backend from [`StorageConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod mongodb;
pub mod postgres;
mod page;
mod repositories;
mod stock;
mod translate;

pub use config::{Backend, ConfigError, StorageConfig};
pub use repositories::{ConnectError, Repositories};
