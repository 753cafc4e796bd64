//! Controllable clocks for service-day tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, Utc};
use mockable::Clock;

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock pinned to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock pinned to noon UTC on `day`.
    pub fn at_noon(day: NaiveDate) -> Self {
        Self::new(day.and_time(NaiveTime::MIN).and_utc() + TimeDelta::hours(12))
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex")
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Clock that moves to the next scripted instant on every read.
///
/// The last instant repeats once the script is exhausted.
pub struct SteppingClock(Mutex<VecDeque<DateTime<Utc>>>);

impl SteppingClock {
    /// Clock reading `instants` in order.
    ///
    /// # Panics
    ///
    /// Panics when `instants` is empty.
    pub fn new(instants: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let script: VecDeque<_> = instants.into_iter().collect();
        assert!(!script.is_empty(), "stepping clock needs an instant");
        Self(Mutex::new(script))
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut script = self.0.lock().expect("clock mutex");
        let now = *script.front().expect("instant present");
        if script.len() > 1 {
            script.pop_front();
        }
        now
    }
}
