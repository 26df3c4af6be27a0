//! Attendance incidence records.
//!
//! # Responsibility
//! - Define the canonical stored record and its write model.
//!
//! # Invariants
//! - `(target_key, date)` is unique across all incidences; the storage layer
//!   enforces it with a UNIQUE constraint.
//! - Records are created or updated by the reconciliation engine and the
//!   matrix projector's materialization path; this crate never deletes them.

use crate::model::state::StateCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One stored attendance record: what happened for one person on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incidence {
    /// Local row id.
    pub id: i64,
    /// Target identity key (name text or worker CI).
    pub target_key: String,
    /// Display name captured at write time.
    pub display_name: String,
    /// Calendar day this record covers.
    pub date: NaiveDate,
    /// Attendance state code, interpreted against the injected catalog.
    pub state: StateCode,
    /// Owning area code.
    pub area_code: String,
    /// Creation time, unix epoch milliseconds.
    pub created_at_ms: i64,
    /// Last update time, unix epoch milliseconds.
    pub updated_at_ms: i64,
}

/// Write model for a new incidence row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncidence {
    pub target_key: String,
    pub display_name: String,
    pub date: NaiveDate,
    pub state: StateCode,
    pub area_code: String,
}
