//! Domain model for attendance incidence tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep target identities immutable value keys for one reconciliation run.
//!
//! # Invariants
//! - At most one incidence exists per `(target_key, date)` pair.
//! - State codes are only meaningful against an injected `StateCatalog`.

pub mod area;
pub mod incidence;
pub mod range;
pub mod state;
pub mod worker;
