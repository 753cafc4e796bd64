//! Streak calculation for the reset and assignment passes.
//!
//! Both passes look at the same input, the user's most recent assignment
//! before the service day, but read it differently:
//!
//! | previous          | reset        | assignment       |
//! |-------------------|--------------|------------------|
//! | none              | unchanged    | set to 1         |
//! | present, no post  | set to 0     | set to 1         |
//! | present, post     | unchanged    | set to streak+1  |
//!
//! The reset pass is authoritative for "was yesterday completed"; the
//! assignment pass only ever increments from the owner's current streak or
//! restarts at one.

use super::AssignmentWithCompletion;

/// Call site the streak is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakContext {
    /// Stale streak cleanup before new tasks are handed out.
    Reset,
    /// Streak written alongside today's new assignment.
    Assignment,
}

/// Outcome of a streak computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Persist this value as the user's streak.
    Set(u32),
    /// Leave the stored streak as it is.
    Unchanged,
}

/// Pure streak rules shared by the scheduler passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator;

impl StreakCalculator {
    /// Streak for a user's first ever assignment.
    pub const FIRST_STREAK: u32 = 1;

    /// Compute the streak update for `previous` in the given context.
    ///
    /// # Examples
    /// ```
    /// use petcare_backend::domain::{StreakCalculator, StreakContext, StreakUpdate};
    ///
    /// assert_eq!(
    ///     StreakCalculator::evaluate(StreakContext::Assignment, None),
    ///     StreakUpdate::Set(1),
    /// );
    /// assert_eq!(
    ///     StreakCalculator::evaluate(StreakContext::Reset, None),
    ///     StreakUpdate::Unchanged,
    /// );
    /// ```
    pub fn evaluate(
        context: StreakContext,
        previous: Option<&AssignmentWithCompletion>,
    ) -> StreakUpdate {
        match (context, previous) {
            (StreakContext::Reset, None) => StreakUpdate::Unchanged,
            (StreakContext::Reset, Some(prev)) if prev.is_completed() => StreakUpdate::Unchanged,
            (StreakContext::Reset, Some(_)) => StreakUpdate::Set(0),
            (StreakContext::Assignment, _) => StreakUpdate::Set(Self::next_streak(previous)),
        }
    }

    /// Next streak in the assignment context.
    pub fn next_streak(previous: Option<&AssignmentWithCompletion>) -> u32 {
        match previous {
            Some(prev) if prev.is_completed() => prev.owner_streak.saturating_add(1),
            Some(_) | None => Self::FIRST_STREAK,
        }
    }
}
