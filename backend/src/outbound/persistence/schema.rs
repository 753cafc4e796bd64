//! Diesel table definitions for the daily task schema.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` when a migration changes.

diesel::table! {
    /// Registered users and their running streak.
    users (id) {
        id -> Uuid,
        /// Consecutive completed days; never negative.
        streak_count -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One assignment per user per calendar day.
    ///
    /// `(user_id, target_date)` is unique.
    daily_tasks (id) {
        id -> Uuid,
        user_id -> Uuid,
        target_date -> Date,
        /// One of `eating`, `sleeping`, `playing`.
        task_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Content posts; a non-null `daily_task_id` marks that task completed.
    posts (id) {
        id -> Uuid,
        user_id -> Uuid,
        daily_task_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Push tokens registered per user device.
    device_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        device_id -> Varchar,
        token -> Varchar,
        platform -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(daily_tasks -> users (user_id));
diesel::joinable!(device_tokens -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, daily_tasks, posts, device_tokens);
