//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{daily_tasks, device_tokens};

/// Row struct for reading from the daily_tasks table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = daily_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DailyTaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_date: NaiveDate,
    pub task_type: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating assignments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = daily_tasks)]
pub(crate) struct NewDailyTaskRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_date: NaiveDate,
    pub task_type: &'a str,
}

/// Projection of the device_tokens table used for dispatch.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = device_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceTokenRow {
    pub token: String,
    pub platform: String,
}
