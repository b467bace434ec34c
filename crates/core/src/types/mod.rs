//! Core types for the marketplace domain.
//!
//! This module provides type-safe identifiers and the enumerations that are
//! persisted as plain string literals.

pub mod category;
pub mod id;
pub mod status;

pub use category::ProductCategory;
pub use id::*;
pub use status::*;
