//! PostgreSQL-backed `UserStore` adapter.
//!
//! Users are listed with keyset pagination over the primary key so a pass
//! never holds a connection between pages and never skips or repeats rows
//! when users register mid-pass.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures_util::stream::{self, StreamExt as _, TryStreamExt as _};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{UserIdStream, UserStore, UserStoreError};

use super::diesel_error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::pool::DbPool;
use super::schema::users;

/// Rows fetched per listing query unless configured otherwise.
pub const DEFAULT_USER_PAGE_SIZE: u32 = 500;

/// Diesel-backed implementation of the `UserStore` port.
#[derive(Clone)]
pub struct DieselUserStore {
    pool: DbPool,
    page_size: u32,
}

impl DieselUserStore {
    /// Store listing users in pages of [`DEFAULT_USER_PAGE_SIZE`].
    pub fn new(pool: DbPool) -> Self {
        Self::with_page_size(pool, DEFAULT_USER_PAGE_SIZE)
    }

    /// Use `page_size` rows per listing query; zero is raised to one.
    pub fn with_page_size(pool: DbPool, page_size: u32) -> Self {
        Self {
            pool,
            page_size: page_size.max(1),
        }
    }

    async fn fetch_page(&self, after: Option<Uuid>) -> Result<Vec<Uuid>, UserStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;
        let limit = i64::from(self.page_size);

        let page = match after {
            Some(cursor) => {
                users::table
                    .select(users::id)
                    .filter(users::id.gt(cursor))
                    .order(users::id.asc())
                    .limit(limit)
                    .load(&mut conn)
                    .await
            }
            None => {
                users::table
                    .select(users::id)
                    .order(users::id.asc())
                    .limit(limit)
                    .load(&mut conn)
                    .await
            }
        };
        page.map_err(|error| map_failure(classify_diesel_error(error)))
    }
}

fn map_failure(failure: StoreFailure) -> UserStoreError {
    match failure {
        StoreFailure::Connection(message) => UserStoreError::connection(message),
        StoreFailure::Query(message) => UserStoreError::query(message),
        StoreFailure::NotFound => UserStoreError::query("record not found"),
        StoreFailure::UniqueViolation | StoreFailure::ForeignKeyViolation => {
            UserStoreError::query("constraint violation")
        }
    }
}

/// Cursor after a page: `None` once a short page shows the table is drained.
fn next_cursor(page: &[Uuid], page_size: u32) -> Option<Option<Uuid>> {
    let full = u32::try_from(page.len()).is_ok_and(|len| len >= page_size);
    if full {
        page.last().copied().map(Some)
    } else {
        None
    }
}

fn streak_for_db(streak: u32) -> Result<i32, UserStoreError> {
    i32::try_from(streak).map_err(|_| UserStoreError::query("streak exceeds column range"))
}

#[async_trait]
impl UserStore for DieselUserStore {
    fn list_all(&self) -> UserIdStream<'_> {
        // `None` is "done", `Some(None)` is "start from the beginning".
        stream::try_unfold(Some(None), move |cursor: Option<Option<Uuid>>| async move {
            let Some(after) = cursor else {
                return Ok::<_, UserStoreError>(None);
            };
            let page = self.fetch_page(after).await?;
            let next = next_cursor(&page, self.page_size);
            Ok(Some((page, next)))
        })
        .map_ok(|page| stream::iter(page.into_iter().map(|id| Ok(UserId::from_uuid(id)))))
        .try_flatten()
        .boxed()
    }

    async fn set_streak(&self, user_id: &UserId, streak: u32) -> Result<(), UserStoreError> {
        let value = streak_for_db(streak)?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;

        let updated = diesel::update(users::table.find(user_id.as_uuid()))
            .set(users::streak_count.eq(value))
            .execute(&mut conn)
            .await
            .map_err(|error| map_failure(classify_diesel_error(error)))?;

        if updated == 0 {
            return Err(UserStoreError::unknown_user(user_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for listing cursors and error mapping.

    use super::*;
    use rstest::rstest;

    fn ids(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    #[rstest]
    fn full_page_continues_after_last_id() {
        let page = ids(3);
        assert_eq!(next_cursor(&page, 3), Some(Some(page[2])));
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn short_page_ends_the_listing(#[case] len: usize) {
        assert_eq!(next_cursor(&ids(len), 3), None);
    }

    #[rstest]
    fn oversized_streak_is_rejected_before_querying() {
        let error = streak_for_db(u32::MAX).expect_err("u32::MAX exceeds int4");
        assert!(matches!(error, UserStoreError::Query { .. }));
        assert_eq!(streak_for_db(42), Ok(42));
    }

    #[rstest]
    fn connection_failures_stay_connection_errors() {
        let error = map_failure(StoreFailure::Connection("refused".to_owned()));
        assert!(error.is_unavailable());
        assert!(error.to_string().contains("refused"));
    }
}
