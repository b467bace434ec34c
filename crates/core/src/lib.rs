//! Marketplace Core - domain types and repository contracts.
//!
//! This crate is shared by every storage backend and by the services that
//! consume them:
//! - `marketplace-repository` - `PostgreSQL` and `MongoDB` implementations
//! - `marketplace-cli` - schema and index management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access.
//! Backends translate their own record shapes into the aggregates defined here
//! and report failures through [`RepositoryError`].
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs and the enumerations stored as string literals
//! - [`model`] - Aggregates (users, carts, products, shops, orders, withdrawals)
//! - [`error`] - The repository error taxonomy
//! - [`repository`] - One async trait per aggregate repository

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod model;
pub mod repository;
pub mod types;

pub use error::{ErrorKind, RepositoryError, Result};
pub use model::*;
pub use repository::*;
pub use types::*;
