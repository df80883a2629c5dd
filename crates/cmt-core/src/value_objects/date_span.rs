//! Inclusive calendar-day ranges with an open-ended sentinel

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Sentinel end date for intervals that never close.
pub fn forever() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// The day before `day`, saturating at the calendar minimum.
pub fn day_before(day: NaiveDate) -> NaiveDate {
    day.pred_opt().unwrap_or(day)
}

/// The day after `day`, saturating at the calendar maximum.
pub fn day_after(day: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(day)
}

/// `[start, end]`, both ends inclusive. `end == forever()` means open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A span that starts on `start` and never ends
    pub fn open(start: NaiveDate) -> Self {
        Self {
            start,
            end: forever(),
        }
    }

    /// `start .. start + days - 1`, i.e. exactly `days` calendar days
    pub fn for_days(start: NaiveDate, days: u64) -> Self {
        let end = start
            .checked_add_days(Days::new(days.saturating_sub(1)))
            .unwrap_or_else(forever);
        Self { start, end }
    }

    /// `months` calendar months from `start`, ending the day before the
    /// same date in the final month
    pub fn for_months(start: NaiveDate, months: u32) -> Self {
        let end = start
            .checked_add_months(Months::new(months))
            .map_or_else(forever, day_before);
        Self { start, end }
    }

    /// `end` given as an optional date, open when absent
    pub fn until(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, DomainError> {
        Self::new(start, end.unwrap_or_else(forever))
    }

    #[inline]
    pub fn is_open_ended(&self) -> bool {
        self.end >= forever()
    }

    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    #[inline]
    pub fn overlaps(&self, other: &DateSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when `other` lies completely within `self`
    #[inline]
    pub fn covers(&self, other: &DateSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersection(&self, other: &DateSpan) -> Option<DateSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateSpan { start, end })
    }

    /// Number of calendar days in the span
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open_ended() {
            write!(f, "{}..", self.start)
        } else {
            write!(f, "{}..={}", self.start, self.end)
        }
    }
}
