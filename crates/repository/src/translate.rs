//! Backend-neutral error translation.
//!
//! Each backend reduces its driver error to a [`Signal`]; the operation being
//! performed decides what an unclassified failure becomes.

use std::fmt::Display;

use marketplace_core::RepositoryError;

/// What the repository was doing when the backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Insert,
    Update,
    Delete,
    /// Opening or committing an atomic unit.
    Transaction,
}

/// The part of a driver error the taxonomy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    NoRecord,
    UniqueViolation,
    Other,
}

/// Map a classified backend failure to the domain taxonomy.
pub fn translate(op: Operation, signal: Signal, err: &impl Display) -> RepositoryError {
    let message = err.to_string();
    match (signal, op) {
        (Signal::NoRecord, _) => RepositoryError::NotExist(message),
        (Signal::UniqueViolation, _) => RepositoryError::Duplicate(message),
        (Signal::Other, Operation::Read | Operation::Insert) => {
            RepositoryError::PersistenceFailed(message)
        }
        (Signal::Other, Operation::Update) => RepositoryError::UpdateFailed(message),
        (Signal::Other, Operation::Delete) => RepositoryError::DeleteFailed(message),
        (Signal::Other, Operation::Transaction) => RepositoryError::TransactionError(message),
    }
}

#[cfg(test)]
mod tests {
    use marketplace_core::ErrorKind;

    use super::*;

    #[test]
    fn test_no_record_is_not_exist_for_every_operation() {
        for op in [
            Operation::Read,
            Operation::Insert,
            Operation::Update,
            Operation::Delete,
            Operation::Transaction,
        ] {
            assert_eq!(
                translate(op, Signal::NoRecord, &"no rows").kind(),
                ErrorKind::NotExist
            );
        }
    }

    #[test]
    fn test_unique_violation_is_duplicate() {
        let err = translate(Operation::Insert, Signal::UniqueViolation, &"E11000");
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(err.message(), "E11000");
    }

    #[test]
    fn test_other_depends_on_operation() {
        let kind = |op| translate(op, Signal::Other, &"boom").kind();
        assert_eq!(kind(Operation::Read), ErrorKind::PersistenceFailed);
        assert_eq!(kind(Operation::Insert), ErrorKind::PersistenceFailed);
        assert_eq!(kind(Operation::Update), ErrorKind::UpdateFailed);
        assert_eq!(kind(Operation::Delete), ErrorKind::DeleteFailed);
        assert_eq!(kind(Operation::Transaction), ErrorKind::TransactionError);
    }
}
