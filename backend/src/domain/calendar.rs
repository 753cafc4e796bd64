//! Service-day calculation.
//!
//! Batch passes key assignments by calendar date. The date is taken from the
//! injected clock shifted into the configured UTC offset so "today" matches
//! the day users see, regardless of where the job runs.

use chrono::{FixedOffset, NaiveDate, Offset as _, Utc};
use mockable::Clock;

/// Maps clock instants to service days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCalendar {
    offset: FixedOffset,
}

impl ServiceCalendar {
    /// Calendar for the given fixed offset.
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar anchored at an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is outside ±24 hours.
    ///
    /// # Examples
    /// ```
    /// use petcare_backend::domain::ServiceCalendar;
    ///
    /// assert!(ServiceCalendar::from_offset_minutes(540).is_some());
    /// assert!(ServiceCalendar::from_offset_minutes(24 * 60).is_none());
    /// ```
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    /// Calendar that uses UTC dates.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Service day for the clock's current instant.
    pub fn today(&self, clock: &dyn Clock) -> NaiveDate {
        clock.utc().with_timezone(&self.offset).date_naive()
    }
}

impl Default for ServiceCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
