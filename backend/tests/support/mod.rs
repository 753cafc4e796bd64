//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates, so suites that need an
//! embedded database pull this module in with `mod support;`.

pub mod embedded_postgres;

pub use embedded_postgres::{
    handle_cluster_setup_failure, provision_empty_database, provision_migrated_database,
};

/// Render a `postgres` error with the server message and SQLSTATE when the
/// failure came from the database.
pub fn describe_postgres_error(error: &postgres::Error) -> String {
    error.as_db_error().map_or_else(
        || error.to_string(),
        |db_error| format!("postgres error {:?}: {}", db_error.code(), db_error.message()),
    )
}
