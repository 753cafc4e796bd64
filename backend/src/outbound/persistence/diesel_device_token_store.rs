//! PostgreSQL-backed `DeviceTokenStore` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DeviceToken, DeviceTokenStore, DeviceTokenStoreError};

use super::diesel_error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::models::DeviceTokenRow;
use super::pool::DbPool;
use super::schema::device_tokens;

/// Diesel-backed implementation of the `DeviceTokenStore` port.
#[derive(Clone)]
pub struct DieselDeviceTokenStore {
    pool: DbPool,
}

impl DieselDeviceTokenStore {
    /// Store reading tokens through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> DeviceTokenStoreError {
    match failure {
        StoreFailure::Connection(message) => DeviceTokenStoreError::connection(message),
        StoreFailure::Query(message) => DeviceTokenStoreError::query(message),
        StoreFailure::NotFound => DeviceTokenStoreError::query("record not found"),
        StoreFailure::UniqueViolation | StoreFailure::ForeignKeyViolation => {
            DeviceTokenStoreError::query("constraint violation")
        }
    }
}

#[async_trait]
impl DeviceTokenStore for DieselDeviceTokenStore {
    async fn list_all(&self) -> Result<Vec<DeviceToken>, DeviceTokenStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;

        let rows: Vec<DeviceTokenRow> = device_tokens::table
            .order((device_tokens::created_at.asc(), device_tokens::id.asc()))
            .select(DeviceTokenRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_failure(classify_diesel_error(error)))?;

        Ok(rows
            .into_iter()
            .map(|row| DeviceToken {
                token: row.token,
                platform: row.platform,
            })
            .collect())
    }
}
