//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! The batch binary is short-lived: the pool never holds idle connections
//! and is sized from the per-pass user concurrency, one connection per
//! in-flight user plus one for the paged user listing.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Errors raised while building the pool or checking out a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection could be checked out.
    #[error("failed to get connection from pool: {message}")]
    Checkout {
        /// Underlying pool or driver message.
        message: String,
    },
    /// The pool could not be created.
    #[error("failed to build connection pool: {message}")]
    Build {
        /// Underlying pool or driver message.
        message: String,
    },
}

impl PoolError {
    /// Checkout failure with `message`.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Build failure with `message`.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Underlying message regardless of variant.
    pub fn into_message(self) -> String {
        match self {
            Self::Checkout { message } | Self::Build { message } => message,
        }
    }
}

/// Connection pool settings.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use petcare_backend::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::for_batch("postgres://localhost/petcare", 8)
///     .with_connection_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_size(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Ten connections with a 30 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Size the pool for `max_concurrent_users` per-user units plus the listing.
    pub fn for_batch(database_url: impl Into<String>, max_concurrent_users: usize) -> Self {
        let units = u32::try_from(max_concurrent_users.max(1)).unwrap_or(u32::MAX - 1);
        Self::new(database_url).with_max_size(units.saturating_add(1))
    }

    /// Cap the pool at `max_size` connections, never below one.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// Time allowed for a connection checkout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Connection string the pool dials.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Maximum number of pooled connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Cloneable handle to the shared connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when bb8 rejects the configuration or the
    /// initial connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);

        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(0))
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection frees up within the
    /// configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_use_ten_connections() {
        let config = PoolConfig::new("postgres://localhost/petcare");

        assert_eq!(config.database_url(), "postgres://localhost/petcare");
        assert_eq!(config.max_size(), 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case(8, 9)]
    #[case(1, 2)]
    #[case(0, 2)]
    fn batch_pool_reserves_a_listing_connection(#[case] users: usize, #[case] expected: u32) {
        let config = PoolConfig::for_batch("postgres://localhost/petcare", users);
        assert_eq!(config.max_size(), expected);
    }

    #[rstest]
    fn zero_max_size_is_raised_to_one() {
        let config = PoolConfig::new("postgres://localhost/petcare").with_max_size(0);
        assert_eq!(config.max_size(), 1);
    }

    #[rstest]
    fn error_messages_survive_unwrapping() {
        assert_eq!(
            PoolError::checkout("timed out").into_message(),
            "timed out"
        );
        assert!(
            PoolError::build("invalid URL")
                .to_string()
                .contains("invalid URL")
        );
    }
}
