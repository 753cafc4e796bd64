//! Error taxonomy for the daily task engine.
//!
//! Port errors are mapped into [`DailyTaskError`] at the domain boundary.
//! Batch passes never propagate these as a single failure: each user's error
//! is recorded in the pass report and processing continues.

use chrono::NaiveDate;

use super::UserId;
use super::ports::{DailyTaskStoreError, DeviceTokenStoreError, UserStoreError};

/// Failure categories surfaced by scheduler and dispatcher operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DailyTaskError {
    /// Transient infrastructure failure; the next scheduled run retries.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Driver or pool message.
        message: String,
    },
    /// Non-transient store failure outside a single user's unit of work.
    #[error("store operation failed: {message}")]
    Store {
        /// Driver or query message.
        message: String,
    },
    /// The user already holds an assignment for the day.
    #[error("daily task already assigned to {user_id} for {target_date}")]
    DuplicateAssignment {
        /// User already holding the assignment.
        user_id: UserId,
        /// Service day of the existing assignment.
        target_date: NaiveDate,
    },
    /// Any other failure isolated to one user's reset or assignment step.
    #[error("processing user {user_id} failed: {message}")]
    PerUserProcessing {
        /// User whose unit of work failed.
        user_id: UserId,
        /// Failure detail.
        message: String,
    },
    /// The push gateway rejected or never received the batch.
    #[error("push dispatch failed: {message}")]
    DispatchFailure {
        /// HTTP status, when the gateway answered.
        status: Option<u16>,
        /// Gateway or transport message.
        message: String,
    },
}

impl DailyTaskError {
    /// Return whether the next scheduled run is expected to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Map a daily task store error raised while handling `user_id`.
    pub(crate) fn from_task_store(
        user_id: UserId,
        target_date: NaiveDate,
        error: DailyTaskStoreError,
    ) -> Self {
        match error {
            DailyTaskStoreError::Connection { message } => Self::StoreUnavailable { message },
            DailyTaskStoreError::DuplicateAssignment { .. } => Self::DuplicateAssignment {
                user_id,
                target_date,
            },
            DailyTaskStoreError::Query { message } => Self::PerUserProcessing { user_id, message },
        }
    }

    /// Map a user store error raised while handling `user_id`.
    pub(crate) fn from_user_store(user_id: UserId, error: UserStoreError) -> Self {
        if error.is_unavailable() {
            return Self::StoreUnavailable {
                message: error.to_string(),
            };
        }
        Self::PerUserProcessing {
            user_id,
            message: error.to_string(),
        }
    }

    /// Map a failure of the user listing itself.
    pub(crate) fn from_user_listing(error: &UserStoreError) -> Self {
        let message = error.to_string();
        if error.is_unavailable() {
            Self::StoreUnavailable { message }
        } else {
            Self::Store { message }
        }
    }

    /// Map a device token store failure.
    pub(crate) fn from_device_tokens(error: DeviceTokenStoreError) -> Self {
        let message = error.to_string();
        if error.is_unavailable() {
            Self::StoreUnavailable { message }
        } else {
            Self::Store { message }
        }
    }
}
