use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Days, Local, NaiveTime};

#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TimeRange {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Exclusive.
    pub end: DateTime<Local>,
}

impl Debug for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl TimeRange {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// Local calendar day at the signed offset from `now`, as `[midnight, next midnight)`.
    ///
    /// Midnights skipped or duplicated by a daylight-saving transition resolve
    /// to the earliest valid instant.
    #[must_use]
    pub fn local_day(now: DateTime<Local>, offset_days: i64) -> Option<Self> {
        let midnight = now.with_time(NaiveTime::MIN).earliest()?;
        let start = if offset_days >= 0 {
            midnight.checked_add_days(Days::new(offset_days.unsigned_abs()))?
        } else {
            midnight.checked_sub_days(Days::new(offset_days.unsigned_abs()))?
        };
        let end = start.checked_add_days(Days::new(1))?;
        Some(Self { start, end })
    }

    #[must_use]
    pub fn contains(self, other: DateTime<Local>) -> bool {
        (self.start <= other) && (other < self.end)
    }
}
