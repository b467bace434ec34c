//! `mongodb` driver error classification and timestamp conversion.

use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::error::{Error, ErrorKind, WriteFailure};

use marketplace_core::RepositoryError;

use crate::translate::{Operation, Signal, translate};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Reduce a driver error to the signal the taxonomy needs.
pub(crate) fn classify(err: &Error) -> Signal {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err))
            if write_err.code == DUPLICATE_KEY =>
        {
            Signal::UniqueViolation
        }
        ErrorKind::Command(command_err) if command_err.code == DUPLICATE_KEY => {
            Signal::UniqueViolation
        }
        _ => Signal::Other,
    }
}

/// Error mapper for `map_err`, bound to the operation being performed.
pub(crate) fn mongo_error(op: Operation) -> impl Fn(Error) -> RepositoryError {
    move |err| translate(op, classify(&err), &err)
}

/// `NotExist` for a point lookup that matched nothing.
pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::NotExist(format!("no {what} with id {id}"))
}

/// Store a timestamp as a BSON date (millisecond precision).
pub(crate) fn to_bson_datetime(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// Read a BSON date back into a UTC timestamp.
pub(crate) fn from_bson_datetime(at: bson::DateTime) -> Result<DateTime<Utc>, RepositoryError> {
    let millis = at.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        RepositoryError::DataCorruption(format!("timestamp {millis}ms is out of range"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use marketplace_core::ErrorKind as DomainErrorKind;

    use super::*;

    #[test]
    fn test_custom_error_is_unclassified() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "socket closed",
        ));
        assert_eq!(classify(&err), Signal::Other);
        assert_eq!(
            mongo_error(Operation::Update)(err).kind(),
            DomainErrorKind::UpdateFailed
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found("user", "abc");
        assert_eq!(err.kind(), DomainErrorKind::NotExist);
        assert_eq!(err.message(), "no user with id abc");
    }

    #[test]
    fn test_timestamp_round_trip_keeps_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 10, 10, 11, 30, 30).unwrap();
        assert_eq!(from_bson_datetime(to_bson_datetime(at)).unwrap(), at);
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let back = from_bson_datetime(to_bson_datetime(at)).unwrap();
        assert_eq!(back.timestamp_subsec_millis(), 123);
        assert_eq!(back.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_out_of_range_timestamp_is_corruption() {
        let err = from_bson_datetime(bson::DateTime::MAX).unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::DataCorruption);
    }
}
