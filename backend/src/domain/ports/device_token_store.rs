//! Driven port for reading registered push device tokens.

use async_trait::async_trait;

use super::define_port_error;

/// A push token registered by one of a user's devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceToken {
    /// Gateway-issued push token.
    pub token: String,
    /// Client platform label (`ios`, `android`, ...).
    pub platform: String,
}

define_port_error! {
    /// Errors raised by device token store adapters.
    pub enum DeviceTokenStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "device token store connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "device token store query failed: {message}",
    }
    unavailable: Connection;
}

/// Port for the device token registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// Load every registered token.
    async fn list_all(&self) -> Result<Vec<DeviceToken>, DeviceTokenStoreError>;
}
