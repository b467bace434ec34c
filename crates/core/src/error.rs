//! Repository error taxonomy.
//!
//! Every backend failure is classified into one of these variants and carries
//! the driver's error text for diagnostics. Nothing is retried; the first
//! failure is returned to the caller.

use thiserror::Error;

/// Result alias for repository operations.
pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

/// Errors returned by every repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// A point lookup matched no record.
    #[error("not exist: {0}")]
    NotExist(String),

    /// A uniqueness constraint was violated.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Unclassified read or insert failure.
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// Unclassified failure while updating a record.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// Failure while deleting a record.
    #[error("delete failed: {0}")]
    DeleteFailed(String),

    /// A multi-step atomic unit could not be opened or committed.
    #[error("transaction error: {0}")]
    TransactionError(String),

    /// An identifier cannot be represented in the backend's native ID type.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A stored record could not be decoded into a domain value.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Placing an order would take a shop item below zero units.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),
}

/// Fieldless discriminant of [`RepositoryError`], handy for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotExist,
    Duplicate,
    PersistenceFailed,
    UpdateFailed,
    DeleteFailed,
    TransactionError,
    InvalidId,
    DataCorruption,
    InsufficientStock,
}

impl RepositoryError {
    /// The kind of this error without its message.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotExist(_) => ErrorKind::NotExist,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
            Self::UpdateFailed(_) => ErrorKind::UpdateFailed,
            Self::DeleteFailed(_) => ErrorKind::DeleteFailed,
            Self::TransactionError(_) => ErrorKind::TransactionError,
            Self::InvalidId(_) => ErrorKind::InvalidId,
            Self::DataCorruption(_) => ErrorKind::DataCorruption,
            Self::InsufficientStock(_) => ErrorKind::InsufficientStock,
        }
    }

    /// The underlying diagnostic text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotExist(m)
            | Self::Duplicate(m)
            | Self::PersistenceFailed(m)
            | Self::UpdateFailed(m)
            | Self::DeleteFailed(m)
            | Self::TransactionError(m)
            | Self::InvalidId(m)
            | Self::DataCorruption(m)
            | Self::InsufficientStock(m) => m,
        }
    }

    /// Returns `true` for [`RepositoryError::NotExist`].
    #[must_use]
    pub const fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist(_))
    }

    /// Returns `true` for [`RepositoryError::Duplicate`].
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<crate::types::status::UnknownVariant> for RepositoryError {
    fn from(err: crate::types::status::UnknownVariant) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::UserRole;

    #[test]
    fn test_display_wraps_backend_text() {
        let err = RepositoryError::NotExist("no rows in result set".to_owned());
        assert_eq!(err.to_string(), "not exist: no rows in result set");
        assert_eq!(err.message(), "no rows in result set");
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            RepositoryError::Duplicate(String::new()).kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(
            RepositoryError::TransactionError(String::new()).kind(),
            ErrorKind::TransactionError
        );
        assert!(RepositoryError::NotExist(String::new()).is_not_exist());
        assert!(!RepositoryError::DeleteFailed(String::new()).is_duplicate());
    }

    #[test]
    fn test_unknown_variant_becomes_data_corruption() {
        let err: RepositoryError = "Admin".parse::<UserRole>().map_err(Into::into).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataCorruption);
        assert!(err.message().contains("Admin"));
    }
}
