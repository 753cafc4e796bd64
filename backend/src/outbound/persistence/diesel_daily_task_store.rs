//! PostgreSQL-backed `DailyTaskStore` adapter.
//!
//! `assign` inserts the assignment and writes the owner's streak in one
//! transaction; the `(user_id, target_date)` unique constraint rolls both back
//! on a duplicate. Lookups join the owner's streak and any completion post in
//! a single query.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{DailyTaskStore, DailyTaskStoreError};
use crate::domain::{
    AssignmentId, AssignmentWithCompletion, DailyTaskAssignment, NewDailyTaskAssignment, PostId,
    TaskType, UserId,
};

use super::diesel_error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::models::{DailyTaskRow, NewDailyTaskRow};
use super::pool::DbPool;
use super::schema::{daily_tasks, posts, users};

type ResolvedRow = (DailyTaskRow, Option<Uuid>, i32);

/// Diesel-backed implementation of the `DailyTaskStore` port.
#[derive(Clone)]
pub struct DieselDailyTaskStore {
    pool: DbPool,
}

impl DieselDailyTaskStore {
    /// Store backed by `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> DailyTaskStoreError {
    match failure {
        StoreFailure::Connection(message) => DailyTaskStoreError::connection(message),
        StoreFailure::Query(message) => DailyTaskStoreError::query(message),
        StoreFailure::NotFound => DailyTaskStoreError::query("record not found"),
        StoreFailure::UniqueViolation => DailyTaskStoreError::query("unexpected unique violation"),
        StoreFailure::ForeignKeyViolation => DailyTaskStoreError::query("owning user not found"),
    }
}

fn map_assign_failure(
    failure: StoreFailure,
    assignment: &NewDailyTaskAssignment,
) -> DailyTaskStoreError {
    match failure {
        StoreFailure::UniqueViolation => {
            DailyTaskStoreError::duplicate(&assignment.user_id, assignment.target_date)
        }
        StoreFailure::NotFound => DailyTaskStoreError::query("owning user not found"),
        other => map_failure(other),
    }
}

fn row_to_assignment(row: DailyTaskRow) -> Result<DailyTaskAssignment, DailyTaskStoreError> {
    let task_type = row.task_type.parse::<TaskType>().map_err(|err| {
        DailyTaskStoreError::query(format!("invalid task type in database: {err}"))
    })?;
    Ok(DailyTaskAssignment {
        id: AssignmentId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        target_date: row.target_date,
        task_type,
        created_at: row.created_at,
    })
}

fn resolve_row(
    (row, post_id, streak): ResolvedRow,
) -> Result<AssignmentWithCompletion, DailyTaskStoreError> {
    let owner_streak = u32::try_from(streak)
        .map_err(|_| DailyTaskStoreError::query(format!("negative streak in database: {streak}")))?;
    Ok(AssignmentWithCompletion {
        assignment: row_to_assignment(row)?,
        completion_post: post_id.map(PostId::from_uuid),
        owner_streak,
    })
}

#[async_trait]
impl DailyTaskStore for DieselDailyTaskStore {
    async fn assign(
        &self,
        assignment: &NewDailyTaskAssignment,
        streak: u32,
    ) -> Result<DailyTaskAssignment, DailyTaskStoreError> {
        let streak_value = i32::try_from(streak)
            .map_err(|_| DailyTaskStoreError::query("streak exceeds column range"))?;
        let owner = *assignment.user_id.as_uuid();
        let new_row = NewDailyTaskRow {
            id: *assignment.id.as_uuid(),
            user_id: owner,
            target_date: assignment.target_date,
            task_type: assignment.task_type.as_str(),
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;

        let inserted = conn
            .transaction(|conn| {
                async move {
                    let inserted = diesel::insert_into(daily_tasks::table)
                        .values(&new_row)
                        .returning(DailyTaskRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let updated = diesel::update(users::table.find(owner))
                        .set(users::streak_count.eq(streak_value))
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Err(diesel::result::Error::NotFound);
                    }

                    Ok(inserted)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_assign_failure(classify_diesel_error(error), assignment))?;

        row_to_assignment(inserted)
    }

    async fn most_recent_before(
        &self,
        user_id: &UserId,
        before: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;

        let row: Option<ResolvedRow> = daily_tasks::table
            .inner_join(users::table.on(users::id.eq(daily_tasks::user_id)))
            .left_join(posts::table.on(posts::daily_task_id.eq(daily_tasks::id.nullable())))
            .filter(daily_tasks::user_id.eq(user_id.as_uuid()))
            .filter(daily_tasks::target_date.lt(before))
            .order((daily_tasks::target_date.desc(), daily_tasks::created_at.desc()))
            .select((
                DailyTaskRow::as_select(),
                posts::id.nullable(),
                users::streak_count,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_failure(classify_diesel_error(error)))?;

        row.map(resolve_row).transpose()
    }

    async fn assignment_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_failure(classify_pool_error(error)))?;

        let row: Option<ResolvedRow> = daily_tasks::table
            .inner_join(users::table.on(users::id.eq(daily_tasks::user_id)))
            .left_join(posts::table.on(posts::daily_task_id.eq(daily_tasks::id.nullable())))
            .filter(daily_tasks::user_id.eq(user_id.as_uuid()))
            .filter(daily_tasks::target_date.eq(date))
            .select((
                DailyTaskRow::as_select(),
                posts::id.nullable(),
                users::streak_count,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_failure(classify_diesel_error(error)))?;

        row.map(resolve_row).transpose()
    }
}
