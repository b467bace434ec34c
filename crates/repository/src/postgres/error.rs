//! `sqlx` error classification and identifier conversion.

use marketplace_core::RepositoryError;
use uuid::Uuid;

use crate::translate::{Operation, Signal, translate};

/// Reduce a `sqlx` error to the signal the taxonomy needs.
pub(crate) fn classify(err: &sqlx::Error) -> Signal {
    match err {
        sqlx::Error::RowNotFound => Signal::NoRecord,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Signal::UniqueViolation,
        _ => Signal::Other,
    }
}

/// Error mapper for `map_err`, bound to the operation being performed.
pub(crate) fn db_error(op: Operation) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| translate(op, classify(&err), &err)
}

/// Parse a domain identifier into the UUID the schema stores.
pub(crate) fn to_uuid(field: &'static str, id: impl AsRef<str>) -> Result<Uuid, RepositoryError> {
    let id = id.as_ref();
    Uuid::parse_str(id)
        .map_err(|e| RepositoryError::InvalidId(format!("{field} {id:?} is not a UUID: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{ErrorKind, UserId};

    use super::*;

    #[test]
    fn test_row_not_found_is_not_exist() {
        let err = db_error(Operation::Read)(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::NotExist);
    }

    #[test]
    fn test_pool_timeout_follows_operation() {
        assert_eq!(
            db_error(Operation::Delete)(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::DeleteFailed
        );
        assert_eq!(
            db_error(Operation::Transaction)(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::TransactionError
        );
    }

    #[test]
    fn test_to_uuid_accepts_hyphenated() {
        let id = UserId::new("30e18bc1-4354-4937-9a3b-03cf0b7027cc");
        assert_eq!(to_uuid("user id", &id).unwrap().to_string(), id.as_str());
    }

    #[test]
    fn test_to_uuid_rejects_garbage() {
        let err = to_uuid("user id", UserId::new("not-a-uuid")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidId);
        assert!(err.message().contains("not-a-uuid"));
    }
}
