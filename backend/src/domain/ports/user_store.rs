//! Driven port for enumerating users and writing their streak counters.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by user store adapters.
    pub enum UserStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "user store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user store query failed: {message}",
        /// No user row matched the identifier.
        UnknownUser { user_id: String } => "user {user_id} does not exist",
    }
    unavailable: Connection;
}

/// Lazy, single-pass sequence of user identifiers.
pub type UserIdStream<'a> = BoxStream<'a, Result<UserId, UserStoreError>>;

/// Port for the user registry as seen by the daily task engine.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stream every registered user once.
    ///
    /// The stream is finite and not restartable; each batch pass calls this
    /// exactly once. An `Err` item ends the listing for the current pass.
    fn list_all(&self) -> UserIdStream<'_>;

    /// Overwrite a user's streak counter.
    async fn set_streak(&self, user_id: &UserId, streak: u32) -> Result<(), UserStoreError>;
}
