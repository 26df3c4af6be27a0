//! Worker references and reconciliation target identities.
//!
//! # Responsibility
//! - Fix the shape of roster entries so the engine is isolated from the
//!   duck-typed directory entries the roster is imported from.
//! - Define the identity key used for incidence uniqueness.
//!
//! # Invariants
//! - `TargetIdentity::key()` is stable for the duration of one run.
//! - Two identities with the same key address the same incidence row.

use serde::{Deserialize, Serialize};

/// One active roster entry for an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRef {
    /// Local row id.
    pub id: i64,
    /// National identity number; the stable cross-system key.
    pub ci: String,
    /// Full display name ("Nombre Apellidos").
    pub display_name: String,
    /// Directory email, when the import had one.
    pub email: Option<String>,
    /// Owning area code.
    pub area_code: String,
}

/// Half of the incidence uniqueness key: who a record belongs to.
///
/// Bulk/manual flows address people by free-text name; roster flows use a
/// structured worker reference. Both collapse to one string key so the two
/// flows share the same record rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetIdentity {
    /// Free-text employee name from the bulk/manual entry paths.
    Name { name: String },
    /// Roster-backed worker reference.
    Worker { worker: WorkerRef },
}

impl TargetIdentity {
    pub fn from_name(name: impl Into<String>) -> Self {
        Self::Name { name: name.into() }
    }

    pub fn from_worker(worker: WorkerRef) -> Self {
        Self::Worker { worker }
    }

    /// Stable identity key: the name text, or the worker's CI.
    pub fn key(&self) -> &str {
        match self {
            Self::Name { name } => name,
            Self::Worker { worker } => &worker.ci,
        }
    }

    /// Human-readable name for matrices and error messages.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Name { name } => name,
            Self::Worker { worker } => &worker.display_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TargetIdentity, WorkerRef};

    fn worker() -> WorkerRef {
        WorkerRef {
            id: 7,
            ci: "85042312345".to_string(),
            display_name: "Ana Pérez".to_string(),
            email: Some("ana@example.org".to_string()),
            area_code: "D-1".to_string(),
        }
    }

    #[test]
    fn name_identity_keys_on_the_name_itself() {
        let target = TargetIdentity::from_name("Juan García");
        assert_eq!(target.key(), "Juan García");
        assert_eq!(target.display_name(), "Juan García");
    }

    #[test]
    fn worker_identity_keys_on_ci_not_display_name() {
        let target = TargetIdentity::from_worker(worker());
        assert_eq!(target.key(), "85042312345");
        assert_eq!(target.display_name(), "Ana Pérez");
    }
}
