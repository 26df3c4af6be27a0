//! Date-range specifications for incidence scheduling.
//!
//! # Responsibility
//! - Describe which calendar days an operation targets, before expansion.
//!
//! # Invariants
//! - A spec is pure data; expansion and validation happen in
//!   `service::calendar`.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which days a range covers, before exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatePattern {
    /// Every day from `start` to `end`, both inclusive.
    Explicit { start: NaiveDate, end: NaiveDate },
    /// Every day of one calendar month.
    FullMonth { year: i32, month: u32 },
    /// The Monday-start week containing the injected "today".
    CurrentWeek,
    /// The Monday-start week immediately after the current one.
    NextWeek,
}

/// A date pattern plus its exclusion modifiers.
///
/// Exclusions are applied after enumeration, in declaration order: weekends,
/// then the explicit weekday set, then holidays. An empty result after
/// exclusion is valid here; callers decide whether an empty product is an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSpec {
    pub pattern: DatePattern,
    pub exclude_weekends: bool,
    pub exclude_weekdays: HashSet<Weekday>,
    pub exclude_holidays: bool,
}

impl DateRangeSpec {
    /// A spec with no exclusions.
    pub fn all_days(pattern: DatePattern) -> Self {
        Self {
            pattern,
            exclude_weekends: false,
            exclude_weekdays: HashSet::new(),
            exclude_holidays: false,
        }
    }

    /// A spec dropping Saturdays and Sundays.
    pub fn weekdays_only(pattern: DatePattern) -> Self {
        Self {
            exclude_weekends: true,
            ..Self::all_days(pattern)
        }
    }
}
