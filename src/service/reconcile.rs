//! Reconciliation of target×date cross-products against the record store.
//!
//! # Responsibility
//! - Apply the conflict decision table per cell and accumulate a run
//!   summary.
//! - Guard combinatorial size before any write happens.
//!
//! # Invariants
//! - Validation and capacity failures happen before the first write.
//! - A cell failure never aborts the run; committed cells stay committed.
//! - Each cell write is one atomic SQL statement; there is no run-level
//!   transaction.

use crate::model::incidence::NewIncidence;
use crate::model::state::{StateCatalog, StateCode};
use crate::model::worker::TargetIdentity;
use crate::repo::incidence_repo::IncidenceStore;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// How an occupied cell is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Replace the existing record's state.
    Overwrite,
    /// Leave the existing record untouched, count the cell as skipped.
    Skip,
    /// Accepted for callers that plan interactive resolution; without a
    /// resolution hook it behaves exactly like `Skip`.
    Defer,
}

/// Outcome of the conflict decision table for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    Create,
    Update,
    Skip,
}

impl ConflictPolicy {
    /// The pure decision table: (existing record?, policy) → action.
    pub fn action(self, exists: bool) -> CellAction {
        if !exists {
            return CellAction::Create;
        }
        match self {
            Self::Overwrite => CellAction::Update,
            Self::Skip | Self::Defer => CellAction::Skip,
        }
    }
}

/// Which entry point produced a reconcile request; selects the cell ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// Bulk creation from an explicit name list.
    NameList,
    /// Roster-based creation for an area.
    Roster,
}

/// Engine limits, injected rather than hardcoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum explicit names accepted by the population resolver.
    pub max_explicit_names: usize,
    /// Cell ceiling for name-list bulk creation.
    pub name_list_cell_ceiling: usize,
    /// Cell ceiling for roster-based creation.
    pub roster_cell_ceiling: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_explicit_names: 100,
            name_list_cell_ceiling: 1_000,
            roster_cell_ceiling: 2_000,
        }
    }
}

impl EngineConfig {
    pub fn cell_ceiling(&self, entry: EntryPoint) -> usize {
        match entry {
            EntryPoint::NameList => self.name_list_cell_ceiling,
            EntryPoint::Roster => self.roster_cell_ceiling,
        }
    }
}

/// The size guard: rejects oversized cross-products before any write.
pub fn check_capacity(
    target_count: usize,
    date_count: usize,
    ceiling: usize,
) -> Result<usize, ReconcileError> {
    let cells = target_count.saturating_mul(date_count);
    if cells > ceiling {
        return Err(ReconcileError::CapacityExceeded { cells, ceiling });
    }
    Ok(cells)
}

/// One reconcile run over resolved targets and dates.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub targets: Vec<TargetIdentity>,
    pub dates: Vec<NaiveDate>,
    /// State applied to every cell the policy lets through.
    pub state: StateCode,
    pub policy: ConflictPolicy,
    /// Owning area for records created under name identities.
    pub area_code: String,
    pub entry: EntryPoint,
}

/// One cell that failed; collected, never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellError {
    pub target_key: String,
    pub date: NaiveDate,
    pub message: String,
}

/// Summary of one reconcile run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Correlation id, also stamped on the run's log lines.
    pub run_id: Uuid,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: Vec<CellError>,
}

impl ReconciliationResult {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            created: 0,
            updated: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }
}

/// Run-level failure, raised before any write.
#[derive(Debug)]
pub enum ReconcileError {
    /// The final target×date product is empty after exclusions.
    EmptyProduct,
    /// Requested state is not in the injected catalog.
    UnknownState(StateCode),
    /// Size guard tripped.
    CapacityExceeded { cells: usize, ceiling: usize },
    /// Store unavailable or misconfigured; aborts the run. Whatever has
    /// already committed stays committed.
    Store(RepoError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProduct => write!(f, "no target/date cells to reconcile"),
            Self::UnknownState(code) => write!(f, "unknown attendance state `{code}`"),
            Self::CapacityExceeded { cells, ceiling } => {
                write!(f, "{cells} cells exceed the ceiling of {ceiling}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ReconcileError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

enum CellOutcome {
    Created,
    Updated,
    Skipped,
}

/// Applies a conflict policy across a target×date cross-product.
pub struct ReconciliationEngine<'a, S: IncidenceStore> {
    store: &'a S,
    catalog: &'a StateCatalog,
    config: EngineConfig,
}

impl<'a, S: IncidenceStore> ReconciliationEngine<'a, S> {
    pub fn new(store: &'a S, catalog: &'a StateCatalog, config: EngineConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// Runs one reconciliation.
    ///
    /// Targets are processed in the outer loop, dates in the inner loop,
    /// sequentially; per-cell failures land in `errors` while the rest of
    /// the run proceeds.
    pub fn run(&self, request: &ReconcileRequest) -> Result<ReconciliationResult, ReconcileError> {
        if request.targets.is_empty() || request.dates.is_empty() {
            return Err(ReconcileError::EmptyProduct);
        }
        if !self.catalog.contains(&request.state) {
            return Err(ReconcileError::UnknownState(request.state.clone()));
        }
        let cells = check_capacity(
            request.targets.len(),
            request.dates.len(),
            self.config.cell_ceiling(request.entry),
        )?;

        let (start, end) = match (request.dates.iter().min(), request.dates.iter().max()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => return Err(ReconcileError::EmptyProduct),
        };

        // Probe the store before the first write so an unavailable store
        // fails the whole run instead of producing one CellError per cell.
        let existing = self.store.count_existing(&request.area_code, start, end)?;

        let run_id = Uuid::new_v4();
        info!(
            "event=reconcile_run module=engine status=start run_id={} area={} targets={} dates={} cells={} existing={} policy={:?}",
            run_id,
            request.area_code,
            request.targets.len(),
            request.dates.len(),
            cells,
            existing,
            request.policy,
        );

        let mut result = ReconciliationResult::new(run_id);
        for target in &request.targets {
            for date in &request.dates {
                match self.apply_cell(target, *date, request) {
                    Ok(CellOutcome::Created) => result.created += 1,
                    Ok(CellOutcome::Updated) => result.updated += 1,
                    Ok(CellOutcome::Skipped) => result.skipped += 1,
                    Err(err) => {
                        warn!(
                            "event=reconcile_cell module=engine status=error run_id={} target={} date={} error={}",
                            run_id,
                            target.key(),
                            date,
                            err
                        );
                        result.errors.push(CellError {
                            target_key: target.key().to_string(),
                            date: *date,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            "event=reconcile_run module=engine status=ok run_id={} created={} updated={} skipped={} errors={}",
            run_id,
            result.created,
            result.updated,
            result.skipped,
            result.errors.len()
        );
        Ok(result)
    }

    fn apply_cell(
        &self,
        target: &TargetIdentity,
        date: NaiveDate,
        request: &ReconcileRequest,
    ) -> Result<CellOutcome, RepoError> {
        let new = NewIncidence {
            target_key: target.key().to_string(),
            display_name: target.display_name().to_string(),
            date,
            state: request.state.clone(),
            area_code: owning_area(target, &request.area_code).to_string(),
        };

        // `insert_if_absent` is the atomic existence check: a `None` return
        // means the cell is occupied right now, with no race window.
        if self.store.insert_if_absent(&new)?.is_some() {
            return Ok(CellOutcome::Created);
        }

        match request.policy.action(true) {
            CellAction::Update => {
                if self
                    .store
                    .overwrite_state(target.key(), date, &request.state)?
                {
                    Ok(CellOutcome::Updated)
                } else {
                    // Only reachable if the record vanished between the two
                    // statements; deletion is an external operation.
                    Err(RepoError::InvalidData(format!(
                        "record for `{}` on {date} disappeared during update",
                        target.key()
                    )))
                }
            }
            CellAction::Skip => Ok(CellOutcome::Skipped),
            CellAction::Create => Ok(CellOutcome::Created),
        }
    }
}

fn owning_area<'t>(target: &'t TargetIdentity, fallback: &'t str) -> &'t str {
    match target {
        TargetIdentity::Worker { worker } => &worker.area_code,
        TargetIdentity::Name { .. } => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::{check_capacity, CellAction, ConflictPolicy, EngineConfig, EntryPoint, ReconcileError};

    #[test]
    fn decision_table_per_policy() {
        for policy in [
            ConflictPolicy::Overwrite,
            ConflictPolicy::Skip,
            ConflictPolicy::Defer,
        ] {
            assert_eq!(policy.action(false), CellAction::Create);
        }
        assert_eq!(ConflictPolicy::Overwrite.action(true), CellAction::Update);
        assert_eq!(ConflictPolicy::Skip.action(true), CellAction::Skip);
        assert_eq!(ConflictPolicy::Defer.action(true), CellAction::Skip);
    }

    #[test]
    fn capacity_guard_uses_the_product() {
        // 50 × 30 = 1500 > 1000 must fail; 20 × 40 = 800 must pass.
        let err = check_capacity(50, 30, 1_000).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::CapacityExceeded {
                cells: 1_500,
                ceiling: 1_000
            }
        ));
        assert_eq!(check_capacity(20, 40, 1_000).unwrap(), 800);
    }

    #[test]
    fn ceilings_differ_per_entry_point() {
        let config = EngineConfig::default();
        assert_eq!(config.cell_ceiling(EntryPoint::NameList), 1_000);
        assert_eq!(config.cell_ceiling(EntryPoint::Roster), 2_000);
    }
}
