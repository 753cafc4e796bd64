//! Driven port for persisting daily task assignments.
//!
//! Assignment creation and the owner's streak write share one transaction so
//! an interrupted run never leaves a new task without its streak (or the
//! reverse). The `(user_id, target_date)` uniqueness constraint surfaces as
//! [`DailyTaskStoreError::DuplicateAssignment`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    AssignmentWithCompletion, DailyTaskAssignment, NewDailyTaskAssignment, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by daily task store adapters.
    pub enum DailyTaskStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "daily task store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "daily task store query failed: {message}",
        /// An assignment already exists for the user on that day.
        DuplicateAssignment { user_id: String, target_date: String } =>
            "daily task already assigned to {user_id} for {target_date}",
    }
    unavailable: Connection;
}

impl DailyTaskStoreError {
    /// Build a duplicate error for a user and day.
    pub fn duplicate(user_id: &UserId, target_date: NaiveDate) -> Self {
        Self::duplicate_assignment(user_id.to_string(), target_date.to_string())
    }
}

/// Port for daily task assignment persistence.
#[async_trait]
pub trait DailyTaskStore: Send + Sync {
    /// Create an assignment and set the owner's streak atomically.
    ///
    /// Returns [`DailyTaskStoreError::DuplicateAssignment`] without applying
    /// the streak when the user already has an assignment for that day.
    async fn assign(
        &self,
        assignment: &NewDailyTaskAssignment,
        streak: u32,
    ) -> Result<DailyTaskAssignment, DailyTaskStoreError>;

    /// Fetch the user's latest assignment dated strictly before `before`.
    async fn most_recent_before(
        &self,
        user_id: &UserId,
        before: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError>;

    /// Fetch the user's assignment for exactly `date`.
    async fn assignment_on(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskStoreError>;
}
