//! Daily batch passes that reset lapsed streaks and hand out new tasks.
//!
//! Each pass streams every user once and runs one unit of work per user with
//! bounded concurrency. A failing user is recorded in the pass report and the
//! pass moves on; nothing short of the listing itself ending stops a pass.
//!
//! Both passes key off the user's most recent assignment dated strictly
//! before the service day. The reset pass leaves users who already hold
//! today's assignment alone, so re-running either pass on the same day is a
//! no-op for users already handled.

use std::collections::HashSet;
use std::future::{Future, ready};
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::StreamExt as _;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{DailyTaskStore, DailyTaskStoreError, UserStore};
use crate::domain::{
    AssignmentId, AssignmentWithCompletion, DailyTaskError, NewDailyTaskAssignment, RandomTaskTypeSelector,
    ServiceCalendar, StreakCalculator, StreakContext, StreakUpdate, TaskTypeSelector, UserId,
};

mod report;

pub use report::{
    BatchPass, BatchReport, DailyRunReport, SingleAssignmentOutcome, UserFailure, UserOutcome,
};

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTaskSchedulerConfig {
    /// Users processed concurrently within one pass. Zero is treated as one.
    pub max_concurrent_users: usize,
    /// Calendar used to derive the service day.
    pub calendar: ServiceCalendar,
}

impl Default for DailyTaskSchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_users: 8,
            calendar: ServiceCalendar::utc(),
        }
    }
}

/// Port bundle required by the scheduler.
pub struct DailyTaskSchedulerPorts {
    /// User registry and streak writes.
    pub users: Arc<dyn UserStore>,
    /// Assignment persistence.
    pub tasks: Arc<dyn DailyTaskStore>,
}

impl DailyTaskSchedulerPorts {
    /// Bundle the user and assignment stores.
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn DailyTaskStore>) -> Self {
        Self { users, tasks }
    }
}

/// Domain-owned daily task scheduler.
pub struct DailyTaskScheduler {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn DailyTaskStore>,
    selector: Arc<dyn TaskTypeSelector>,
    clock: Arc<dyn Clock>,
    config: DailyTaskSchedulerConfig,
}

impl DailyTaskScheduler {
    /// Build a scheduler that picks task types at random.
    pub fn new(
        ports: DailyTaskSchedulerPorts,
        clock: Arc<dyn Clock>,
        config: DailyTaskSchedulerConfig,
    ) -> Self {
        Self::with_selector(ports, clock, Arc::new(RandomTaskTypeSelector), config)
    }

    /// Build a scheduler with an injected task type selector.
    pub fn with_selector(
        ports: DailyTaskSchedulerPorts,
        clock: Arc<dyn Clock>,
        selector: Arc<dyn TaskTypeSelector>,
        config: DailyTaskSchedulerConfig,
    ) -> Self {
        Self {
            users: ports.users,
            tasks: ports.tasks,
            selector,
            clock,
            config,
        }
    }

    /// Service day for the clock's current instant.
    pub fn service_day(&self) -> NaiveDate {
        self.config.calendar.today(self.clock.as_ref())
    }

    /// Zero the streak of every user who missed their previous task.
    pub async fn reset_lapsed_streaks(&self) -> BatchReport {
        self.reset_pass(self.service_day()).await
    }

    /// Create today's assignment for every user and advance their streak.
    pub async fn assign_new_tasks(&self) -> BatchReport {
        self.assign_pass(self.service_day()).await
    }

    /// Run the reset pass to completion, then the assignment pass.
    ///
    /// The service day is read once, so both passes target the same day even
    /// when the run crosses midnight. The assignment pass runs regardless of
    /// reset failures.
    pub async fn run_daily(&self) -> DailyRunReport {
        let today = self.service_day();
        let reset = self.reset_pass(today).await;
        let assignment = self.assign_pass(today).await;
        DailyRunReport { reset, assignment }
    }

    /// Give one user today's assignment with a first-task streak.
    ///
    /// Used outside the batch, typically at registration. An existing
    /// assignment for today is reported, not treated as an error.
    pub async fn create_single_assignment(
        &self,
        user_id: UserId,
    ) -> Result<SingleAssignmentOutcome, DailyTaskError> {
        let today = self.service_day();
        let streak = StreakCalculator::FIRST_STREAK;
        match self.insert_assignment(user_id, today, streak).await {
            Ok(assignment_id) => Ok(SingleAssignmentOutcome::Created {
                assignment_id,
                streak,
            }),
            Err(DailyTaskError::DuplicateAssignment { .. }) => {
                info!(user_id = %user_id, service_day = %today, "daily task already assigned");
                Ok(SingleAssignmentOutcome::AlreadyAssigned)
            }
            Err(error) => Err(error),
        }
    }

    /// Today's assignment for the user, with its completion link.
    pub async fn current_assignment(
        &self,
        user_id: UserId,
    ) -> Result<Option<AssignmentWithCompletion>, DailyTaskError> {
        let today = self.service_day();
        self.tasks
            .assignment_on(&user_id, today)
            .await
            .map_err(|error| DailyTaskError::from_task_store(user_id, today, error))
    }

    async fn reset_pass(&self, today: NaiveDate) -> BatchReport {
        self.run_pass(BatchPass::Reset, today, |user_id| {
            self.reset_user(user_id, today)
        })
        .await
    }

    async fn assign_pass(&self, today: NaiveDate) -> BatchReport {
        self.run_pass(BatchPass::Assignment, today, |user_id| {
            self.assign_user(user_id, today)
        })
        .await
    }

    async fn run_pass<F, Fut>(&self, pass: BatchPass, today: NaiveDate, process: F) -> BatchReport
    where
        F: Fn(UserId) -> Fut,
        Fut: Future<Output = UserOutcome>,
    {
        let limit = self.config.max_concurrent_users.max(1);
        let process = &process;
        let mut seen = HashSet::new();
        let mut report = BatchReport::new(pass, today);

        let mut outcomes = self
            .users
            .list_all()
            .filter(move |item| {
                let first_visit = match item {
                    Ok(user_id) => seen.insert(*user_id),
                    Err(_) => true,
                };
                if !first_visit {
                    debug!(pass = pass.as_str(), "user listed twice; ignoring repeat");
                }
                ready(first_visit)
            })
            .map(move |item| async move {
                match item {
                    Ok(user_id) => Ok(process(user_id).await),
                    Err(error) => Err(error),
                }
            })
            .buffer_unordered(limit);

        while let Some(result) = outcomes.next().await {
            match result {
                Ok(outcome) => {
                    if let UserOutcome::Failed(failure) = &outcome {
                        warn!(
                            pass = pass.as_str(),
                            user_id = %outcome.user_id(),
                            error = %failure.error,
                            "user processing failed"
                        );
                    } else {
                        debug!(pass = pass.as_str(), user_id = %outcome.user_id(), "user processed");
                    }
                    report.record(outcome);
                }
                Err(error) => {
                    warn!(pass = pass.as_str(), error = %error, "user listing failed");
                    report.listing_failure = Some(DailyTaskError::from_user_listing(&error));
                }
            }
        }

        info!(
            pass = pass.as_str(),
            service_day = %today,
            visited = report.visited(),
            succeeded = report.updated,
            unchanged = report.unchanged,
            already_assigned = report.already_assigned,
            failed = report.failures.len(),
            listing_failed = report.listing_failure.is_some(),
            "daily task pass finished"
        );
        report
    }

    async fn reset_user(&self, user_id: UserId, today: NaiveDate) -> UserOutcome {
        // Today's assignment already carries a streak derived from the
        // previous task; zeroing it now would undo that.
        match self.tasks.assignment_on(&user_id, today).await {
            Ok(Some(_)) => return UserOutcome::Unchanged { user_id },
            Ok(None) => {}
            Err(error) => return task_store_outcome(user_id, today, error),
        }

        let previous = match self.tasks.most_recent_before(&user_id, today).await {
            Ok(previous) => previous,
            Err(error) => return task_store_outcome(user_id, today, error),
        };

        match StreakCalculator::evaluate(StreakContext::Reset, previous.as_ref()) {
            StreakUpdate::Unchanged if previous.is_some() => UserOutcome::Unchanged { user_id },
            StreakUpdate::Unchanged => UserOutcome::Skipped { user_id },
            StreakUpdate::Set(streak) => match self.users.set_streak(&user_id, streak).await {
                Ok(()) => UserOutcome::Updated {
                    user_id,
                    streak,
                    assignment_id: None,
                },
                Err(error) => {
                    UserOutcome::failed(user_id, DailyTaskError::from_user_store(user_id, error))
                }
            },
        }
    }

    async fn assign_user(&self, user_id: UserId, today: NaiveDate) -> UserOutcome {
        let previous = match self.tasks.most_recent_before(&user_id, today).await {
            Ok(previous) => previous,
            Err(error) => return task_store_outcome(user_id, today, error),
        };
        let streak = StreakCalculator::next_streak(previous.as_ref());
        self.create_assignment(user_id, today, streak).await
    }

    async fn create_assignment(
        &self,
        user_id: UserId,
        today: NaiveDate,
        streak: u32,
    ) -> UserOutcome {
        match self.insert_assignment(user_id, today, streak).await {
            Ok(assignment_id) => UserOutcome::Updated {
                user_id,
                streak,
                assignment_id: Some(assignment_id),
            },
            Err(error) => error_outcome(user_id, today, error),
        }
    }

    async fn insert_assignment(
        &self,
        user_id: UserId,
        today: NaiveDate,
        streak: u32,
    ) -> Result<AssignmentId, DailyTaskError> {
        let request = NewDailyTaskAssignment::new(user_id, today, self.selector.select());
        let created = self
            .tasks
            .assign(&request, streak)
            .await
            .map_err(|error| DailyTaskError::from_task_store(user_id, today, error))?;
        debug!(
            user_id = %user_id,
            assignment_id = %created.id,
            task_type = %created.task_type,
            streak,
            "daily task assigned"
        );
        Ok(created.id)
    }
}

fn task_store_outcome(
    user_id: UserId,
    today: NaiveDate,
    error: DailyTaskStoreError,
) -> UserOutcome {
    error_outcome(
        user_id,
        today,
        DailyTaskError::from_task_store(user_id, today, error),
    )
}

fn error_outcome(user_id: UserId, today: NaiveDate, error: DailyTaskError) -> UserOutcome {
    match error {
        DailyTaskError::DuplicateAssignment { .. } => {
            info!(user_id = %user_id, service_day = %today, "daily task already assigned");
            UserOutcome::AlreadyAssigned { user_id }
        }
        error => UserOutcome::failed(user_id, error),
    }
}
