//! Daily task assignments and their completion state.
//!
//! An assignment is an immutable fact: one task for one user on one calendar
//! day. Completion is never written here; it is observed through an optional
//! post linked to the assignment by the posting flow.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TaskType, UserId};

/// Opaque identifier of a daily task assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a content post that fulfils an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// A persisted daily task assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskAssignment {
    /// Assignment identifier.
    pub id: AssignmentId,
    /// Owning user.
    pub user_id: UserId,
    /// Service day the task belongs to.
    pub target_date: NaiveDate,
    /// Task the user was given.
    pub task_type: TaskType,
    /// Insert time; orders same-day assignments.
    pub created_at: DateTime<Utc>,
}

/// Creation request for one assignment.
///
/// The store assigns `created_at`; `id` is generated up front so callers can
/// log it before the insert commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDailyTaskAssignment {
    /// Identifier the stored row will carry.
    pub id: AssignmentId,
    /// Owning user.
    pub user_id: UserId,
    /// Service day the task belongs to.
    pub target_date: NaiveDate,
    /// Task to assign.
    pub task_type: TaskType,
}

impl NewDailyTaskAssignment {
    /// Build a creation request with a fresh identifier.
    pub fn new(user_id: UserId, target_date: NaiveDate, task_type: TaskType) -> Self {
        Self {
            id: AssignmentId::random(),
            user_id,
            target_date,
            task_type,
        }
    }
}

/// An assignment together with its completion link and the owner's streak.
///
/// This is the resolved input to the streak calculator: the owner's current
/// streak is read in the same query as the assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithCompletion {
    /// The stored assignment.
    pub assignment: DailyTaskAssignment,
    /// Post that completed the task, if any.
    pub completion_post: Option<PostId>,
    /// Owner's streak at read time.
    pub owner_streak: u32,
}

impl AssignmentWithCompletion {
    /// Return whether a post has been linked to the assignment.
    pub const fn is_completed(&self) -> bool {
        self.completion_post.is_some()
    }
}
