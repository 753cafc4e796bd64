//! Domain primitives, ports, and services for the daily task engine.
//!
//! Purpose: model users' daily assignments and streaks, and orchestrate the
//! once-a-day batch passes and reminder dispatch over driven ports. Nothing
//! here talks to a database or network directly; adapters live in
//! `crate::outbound`.
//!
//! Public surface:
//! - [`DailyTaskScheduler`]: reset and assignment passes, plus single-user
//!   helpers.
//! - [`PushNotificationDispatcher`]: batched reminder delivery.
//! - [`StreakCalculator`]: the pure streak rules both passes share.
//! - [`DailyTaskError`]: the error taxonomy surfaced by services.

pub mod calendar;
pub mod daily_task;
pub mod daily_task_scheduler;
pub mod error;
pub mod ports;
pub mod push_notification;
pub mod streak;
pub mod task_type;
pub mod user;

pub use self::calendar::ServiceCalendar;
pub use self::daily_task::{
    AssignmentId, AssignmentWithCompletion, DailyTaskAssignment, NewDailyTaskAssignment, PostId,
};
pub use self::daily_task_scheduler::{
    BatchPass, BatchReport, DailyRunReport, DailyTaskScheduler, DailyTaskSchedulerConfig,
    DailyTaskSchedulerPorts, SingleAssignmentOutcome, UserFailure, UserOutcome,
};
pub use self::error::DailyTaskError;
pub use self::push_notification::{DispatchReport, PushNotificationDispatcher, ReminderContent};
pub use self::streak::{StreakCalculator, StreakContext, StreakUpdate};
pub use self::task_type::{
    FixedTaskTypeSelector, ParseTaskTypeError, RandomTaskTypeSelector, TaskType, TaskTypeSelector,
};
pub use self::user::{UserId, UserValidationError};
