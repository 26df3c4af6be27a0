//! Dense target×date matrix projection.
//!
//! # Responsibility
//! - Build the employee-by-day grid the display layer renders.
//! - Materialize default records for empty cells on first render
//!   (weekend rest state, weekday default-present state).
//!
//! # Invariants
//! - Materialization goes through `insert_if_absent`, so re-rendering a cell
//!   never creates a duplicate nor changes an already-edited state.
//! - The `NotRecorded` sentinel is a distinct variant and can never collide
//!   with a real state value.

use crate::model::incidence::{Incidence, NewIncidence};
use crate::model::state::StateCatalog;
use crate::model::worker::TargetIdentity;
use crate::repo::incidence_repo::IncidenceStore;
use crate::repo::RepoError;
use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One cell of the projected matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatrixCell {
    /// A stored record covers this cell.
    Recorded { record: Incidence },
    /// No record was visible when this projection was built.
    NotRecorded,
}

/// One row: a target and its cell per date-axis entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub target: TargetIdentity,
    pub cells: Vec<MatrixCell>,
}

/// The dense grid handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMatrix {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<MatrixRow>,
}

/// Matrix projection failure.
#[derive(Debug)]
pub enum MatrixError {
    /// Record store failure.
    Store(RepoError),
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MatrixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for MatrixError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Projects resolved records plus synthesized defaults onto a dense grid.
///
/// The date axis is supplied by the caller and deliberately not bounded by
/// the creation-path span ceiling; display ranges may differ from creation
/// ranges.
pub struct MatrixProjector<'a, S: IncidenceStore> {
    store: &'a S,
    catalog: &'a StateCatalog,
}

impl<'a, S: IncidenceStore> MatrixProjector<'a, S> {
    pub fn new(store: &'a S, catalog: &'a StateCatalog) -> Self {
        Self { store, catalog }
    }

    /// Builds the matrix for the given axes.
    ///
    /// `area_code` owns records materialized for name-based targets; worker
    /// targets keep their own area.
    pub fn project(
        &self,
        targets: &[TargetIdentity],
        dates: &[NaiveDate],
        area_code: &str,
    ) -> Result<AttendanceMatrix, MatrixError> {
        if targets.is_empty() || dates.is_empty() {
            return Ok(AttendanceMatrix {
                dates: dates.to_vec(),
                rows: targets
                    .iter()
                    .map(|target| MatrixRow {
                        target: target.clone(),
                        cells: Vec::new(),
                    })
                    .collect(),
            });
        }

        let (start, end) = match (dates.iter().min(), dates.iter().max()) {
            (Some(start), Some(end)) => (*start, *end),
            // Unreachable: dates was checked non-empty above.
            _ => {
                return Ok(AttendanceMatrix {
                    dates: dates.to_vec(),
                    rows: Vec::new(),
                })
            }
        };

        let keys: Vec<String> = targets.iter().map(|t| t.key().to_string()).collect();
        let mut by_cell: HashMap<(String, NaiveDate), Incidence> = self
            .store
            .list_for_targets(&keys, start, end)?
            .into_iter()
            .map(|record| ((record.target_key.clone(), record.date), record))
            .collect();

        let mut materialized = 0u64;
        let mut rows = Vec::with_capacity(targets.len());
        for target in targets {
            let mut cells = Vec::with_capacity(dates.len());
            for date in dates {
                let key = (target.key().to_string(), *date);
                let cell = match by_cell.remove(&key) {
                    Some(record) => MatrixCell::Recorded { record },
                    None => {
                        let (cell, wrote) = self.fill_cell(target, *date, area_code)?;
                        if wrote {
                            materialized += 1;
                        }
                        cell
                    }
                };
                cells.push(cell);
            }
            rows.push(MatrixRow {
                target: target.clone(),
                cells,
            });
        }

        debug!(
            "event=matrix_project module=engine status=ok area={} targets={} dates={} materialized={}",
            area_code,
            targets.len(),
            dates.len(),
            materialized
        );

        Ok(AttendanceMatrix {
            dates: dates.to_vec(),
            rows,
        })
    }

    /// Handles one cell with no prefetched record.
    ///
    /// Weekends materialize (and show) the rest-day state. Other weekdays
    /// materialize the default-present record but render the sentinel on
    /// this first projection; the record shows from the next one.
    fn fill_cell(
        &self,
        target: &TargetIdentity,
        date: NaiveDate,
        area_code: &str,
    ) -> Result<(MatrixCell, bool), MatrixError> {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let state = if weekend {
            self.catalog.rest_day().clone()
        } else {
            self.catalog.default_present().clone()
        };

        let owning_area = match target {
            TargetIdentity::Worker { worker } => worker.area_code.as_str(),
            TargetIdentity::Name { .. } => area_code,
        };

        let new = NewIncidence {
            target_key: target.key().to_string(),
            display_name: target.display_name().to_string(),
            date,
            state,
            area_code: owning_area.to_string(),
        };

        match self.store.insert_if_absent(&new)? {
            Some(record) if weekend => Ok((MatrixCell::Recorded { record }, true)),
            Some(_) => Ok((MatrixCell::NotRecorded, true)),
            // The prefetch was stale: someone wrote this cell since. Show
            // whatever is stored now.
            None => match self.store.find_by_key(target.key(), date)? {
                Some(record) => Ok((MatrixCell::Recorded { record }, false)),
                None => Ok((MatrixCell::NotRecorded, false)),
            },
        }
    }
}
