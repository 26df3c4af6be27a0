//! Attendance incidence scheduling and reconciliation engine.
//!
//! Expands date-range specifications into concrete calendar dates, resolves
//! target populations from explicit names or area rosters, reconciles the
//! target×date cross-product against the record store under a conflict
//! policy, and projects the result as a dense employee×day matrix with
//! weekend auto-fill. This crate is the single source of truth for the
//! one-record-per-person-per-day invariant.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::area::Area;
pub use model::incidence::{Incidence, NewIncidence};
pub use model::range::{DatePattern, DateRangeSpec};
pub use model::state::{CatalogError, StateCatalog, StateCode, StateDef};
pub use model::worker::{TargetIdentity, WorkerRef};
pub use repo::directory_repo::{AreaLookup, RosterLookup, SqliteDirectory};
pub use repo::incidence_repo::{IncidenceStore, SqliteIncidenceStore};
pub use repo::{RepoError, RepoResult};
pub use service::calendar::{
    expand_range, Clock, HolidayCalendar, NoHolidays, RangeError, SystemClock,
    MAX_EXPLICIT_SPAN_DAYS,
};
pub use service::matrix::{AttendanceMatrix, MatrixCell, MatrixError, MatrixProjector, MatrixRow};
pub use service::population::{PopulationError, PopulationResolver, PopulationSpec};
pub use service::reconcile::{
    check_capacity, CellAction, CellError, ConflictPolicy, EngineConfig, EntryPoint,
    ReconcileError, ReconcileRequest, ReconciliationEngine, ReconciliationResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
