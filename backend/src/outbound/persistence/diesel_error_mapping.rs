//! Shared classification of Diesel and pool failures.
//!
//! Each store maps a [`StoreFailure`] into its own port error so the domain
//! sees connection problems, duplicates, and everything else distinctly.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Coarse category of a persistence failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    /// Connection lost or never obtained.
    Connection(String),
    /// Unique constraint rejected the write.
    UniqueViolation,
    /// Foreign key constraint rejected the write.
    ForeignKeyViolation,
    /// A statement expected a row and found none.
    NotFound,
    /// Any other query failure.
    Query(String),
}

/// Classify a Diesel error, logging its details at debug level.
pub(crate) fn classify_diesel_error(error: DieselError) -> StoreFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => StoreFailure::NotFound,
        DieselError::QueryBuilderError(_) => {
            StoreFailure::Query("database query error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreFailure::UniqueViolation
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreFailure::ForeignKeyViolation
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreFailure::Connection("database connection error".to_owned())
        }
        DieselError::DeserializationError(error) => {
            StoreFailure::Query(format!("row decoding failed: {error}"))
        }
        _ => StoreFailure::Query("database error".to_owned()),
    }
}

/// Pool failures always surface as connection failures.
pub(crate) fn classify_pool_error(error: PoolError) -> StoreFailure {
    StoreFailure::Connection(error.into_message())
}
