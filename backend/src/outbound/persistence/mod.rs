//! PostgreSQL persistence adapters using Diesel.
//!
//! Adapters translate between Diesel rows and domain types and map database
//! failures into port errors. Row structs and the schema stay private to this
//! module; connections come from a shared `bb8` pool via `diesel-async`.
//!
//! # Example
//!
//! ```ignore
//! use petcare_backend::outbound::persistence::{DbPool, DieselUserStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::for_batch("postgres://localhost/petcare", 8)).await?;
//! let users = DieselUserStore::new(pool);
//! ```

mod diesel_daily_task_store;
mod diesel_device_token_store;
mod diesel_error_mapping;
mod diesel_user_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_daily_task_store::DieselDailyTaskStore;
pub use diesel_device_token_store::DieselDeviceTokenStore;
pub use diesel_user_store::{DEFAULT_USER_PAGE_SIZE, DieselUserStore};
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
