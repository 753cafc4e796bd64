//! Per-user outcomes and pass summaries.

use chrono::NaiveDate;

use crate::domain::{AssignmentId, DailyTaskError, UserId};

/// Batch pass a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPass {
    /// Zeroes streaks of users who missed their previous task.
    Reset,
    /// Creates the service day's assignment for every user.
    Assignment,
}

impl BatchPass {
    /// Lowercase pass name used in logs and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Assignment => "assignment",
        }
    }
}

/// A user whose unit of work failed, with the cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFailure {
    /// User whose unit of work failed.
    pub user_id: UserId,
    /// Cause of the failure.
    pub error: DailyTaskError,
}

/// Result of processing one user within a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    /// The streak was written; `assignment_id` is set by the assignment pass.
    Updated {
        /// Processed user.
        user_id: UserId,
        /// Streak value written.
        streak: u32,
        /// Assignment created for the service day.
        assignment_id: Option<AssignmentId>,
    },
    /// The previous task was completed so the streak stands.
    Unchanged {
        /// Processed user.
        user_id: UserId,
    },
    /// An assignment for the service day already existed.
    AlreadyAssigned {
        /// Processed user.
        user_id: UserId,
    },
    /// The user has no assignment before the service day.
    Skipped {
        /// Processed user.
        user_id: UserId,
    },
    /// The unit of work failed; the pass carried on.
    Failed(UserFailure),
}

impl UserOutcome {
    pub(crate) fn failed(user_id: UserId, error: DailyTaskError) -> Self {
        Self::Failed(UserFailure { user_id, error })
    }

    /// User this outcome belongs to.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Updated { user_id, .. }
            | Self::Unchanged { user_id }
            | Self::AlreadyAssigned { user_id }
            | Self::Skipped { user_id } => *user_id,
            Self::Failed(failure) => failure.user_id,
        }
    }
}

/// Summary of one pass over every user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Pass that produced this report.
    pub pass: BatchPass,
    /// Day the pass processed.
    pub service_day: NaiveDate,
    /// Users whose state changed.
    pub updated: usize,
    /// Users visited without any write, skipped ones included.
    pub unchanged: usize,
    /// Users skipped because today's assignment already existed.
    pub already_assigned: usize,
    /// Users whose unit of work failed, in completion order.
    pub failures: Vec<UserFailure>,
    /// Set when the user listing ended early; later users were not visited.
    pub listing_failure: Option<DailyTaskError>,
}

impl BatchReport {
    pub(crate) fn new(pass: BatchPass, service_day: NaiveDate) -> Self {
        Self {
            pass,
            service_day,
            updated: 0,
            unchanged: 0,
            already_assigned: 0,
            failures: Vec::new(),
            listing_failure: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: UserOutcome) {
        match outcome {
            UserOutcome::Updated { .. } => self.updated += 1,
            UserOutcome::Unchanged { .. } | UserOutcome::Skipped { .. } => self.unchanged += 1,
            UserOutcome::AlreadyAssigned { .. } => self.already_assigned += 1,
            UserOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    /// Users visited in this pass, failed ones included.
    pub fn visited(&self) -> usize {
        self.updated + self.unchanged + self.already_assigned + self.failures.len()
    }

    /// Return whether every user succeeded and the listing completed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.listing_failure.is_none()
    }

    /// Identifiers of the users that failed.
    pub fn failed_user_ids(&self) -> Vec<UserId> {
        self.failures.iter().map(|failure| failure.user_id).collect()
    }
}

/// Reports of both passes of a daily run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRunReport {
    /// Reset pass summary.
    pub reset: BatchReport,
    /// Assignment pass summary.
    pub assignment: BatchReport,
}

impl DailyRunReport {
    /// Return whether both passes were clean.
    pub fn is_clean(&self) -> bool {
        self.reset.is_clean() && self.assignment.is_clean()
    }
}

/// Outcome of assigning a task to a single user on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleAssignmentOutcome {
    /// A new assignment was stored with the given streak.
    Created {
        /// Stored assignment.
        assignment_id: AssignmentId,
        /// Streak written alongside it.
        streak: u32,
    },
    /// The user already held an assignment for the day.
    AlreadyAssigned,
}
