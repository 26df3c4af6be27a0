//! Calendar range expansion.
//!
//! # Responsibility
//! - Expand a `DateRangeSpec` into an ordered sequence of distinct dates.
//! - Apply weekday/holiday exclusions after enumeration.
//!
//! # Invariants
//! - Output is ascending with no duplicates.
//! - Weeks start on Monday and span 7 days.
//! - "Today" comes from an injected clock, never the wall clock directly.

use crate::model::range::{DatePattern, DateRangeSpec};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hard ceiling on explicit range length, keeping one expansion bounded to
/// about a year of cells before the size guard even runs.
pub const MAX_EXPLICIT_SPAN_DAYS: i64 = 365;

/// Source of "today" for week-relative patterns.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation for production callers.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Externally supplied holiday set.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl HolidayCalendar for HashSet<NaiveDate> {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.contains(&date)
    }
}

/// Calendar with no holidays at all.
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Range expansion failure.
#[derive(Debug, PartialEq, Eq)]
pub enum RangeError {
    /// Explicit range with `start > end`.
    EmptyRange { start: NaiveDate, end: NaiveDate },
    /// Explicit range longer than [`MAX_EXPLICIT_SPAN_DAYS`].
    SpanTooLong { days: i64, max: i64 },
    /// Month outside `1..=12` or otherwise unrepresentable.
    InvalidMonth { year: i32, month: u32 },
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRange { start, end } => {
                write!(f, "range start {start} is after range end {end}")
            }
            Self::SpanTooLong { days, max } => {
                write!(f, "range spans {days} days, more than the allowed {max}")
            }
            Self::InvalidMonth { year, month } => write!(f, "invalid month {month} of {year}"),
        }
    }
}

impl Error for RangeError {}

/// Expands a range spec into the concrete, filtered list of dates.
///
/// Exclusions never fail: an empty output is valid and the caller decides
/// whether an empty target×date product is an error.
pub fn expand_range(
    spec: &DateRangeSpec,
    clock: &dyn Clock,
    holidays: &dyn HolidayCalendar,
) -> Result<Vec<NaiveDate>, RangeError> {
    let (start, end) = pattern_bounds(&spec.pattern, clock)?;

    let mut dates: Vec<NaiveDate> = start.iter_days().take_while(|date| *date <= end).collect();

    if spec.exclude_weekends {
        dates.retain(|date| !is_weekend(*date));
    }
    if !spec.exclude_weekdays.is_empty() {
        dates.retain(|date| !spec.exclude_weekdays.contains(&date.weekday()));
    }
    if spec.exclude_holidays {
        dates.retain(|date| !holidays.is_holiday(*date));
    }

    Ok(dates)
}

fn pattern_bounds(pattern: &DatePattern, clock: &dyn Clock) -> Result<(NaiveDate, NaiveDate), RangeError> {
    match pattern {
        DatePattern::Explicit { start, end } => {
            if start > end {
                return Err(RangeError::EmptyRange {
                    start: *start,
                    end: *end,
                });
            }
            let days = (*end - *start).num_days();
            if days > MAX_EXPLICIT_SPAN_DAYS {
                return Err(RangeError::SpanTooLong {
                    days,
                    max: MAX_EXPLICIT_SPAN_DAYS,
                });
            }
            Ok((*start, *end))
        }
        DatePattern::FullMonth { year, month } => month_bounds(*year, *month),
        DatePattern::CurrentWeek => Ok(week_bounds(monday_of(clock.today()))),
        DatePattern::NextWeek => Ok(week_bounds(monday_of(clock.today()) + Duration::days(7))),
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), RangeError> {
    let invalid = RangeError::InvalidMonth { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(RangeError::InvalidMonth { year, month })?;
    let last = next_first
        .pred_opt()
        .ok_or(RangeError::InvalidMonth { year, month })?;

    Ok((first, last))
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn week_bounds(monday: NaiveDate) -> (NaiveDate, NaiveDate) {
    (monday, monday + Duration::days(6))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
