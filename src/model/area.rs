//! Organizational area model.
//!
//! # Responsibility
//! - Represent one node of the area/department tree.
//!
//! # Invariants
//! - `code` is the stable identity used by incidences and workers.
//! - `parent_code` of `None` (or an unresolvable code) means root: the
//!   directory never descends further through it.

use serde::{Deserialize, Serialize};

/// One organizational area (department/unit).
///
/// Areas form a tree via `parent_code`. The directory import can in theory
/// produce a cyclic or dangling parent reference; consumers treat such links
/// as "no further descent" rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Stable area code, e.g. `"D-014"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Parent area code. `None` for root-level areas.
    pub parent_code: Option<String>,
}

impl Area {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        parent_code: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            // Blank parent codes come out of the directory import as empty
            // strings; normalize them to None.
            parent_code: parent_code.filter(|code| !code.trim().is_empty()),
        }
    }

    /// Returns whether `candidate` is a plausible child link of this area.
    ///
    /// A node that names itself as parent is rejected so a corrupted import
    /// cannot echo an area back into its own child list.
    pub fn is_child(&self, candidate: &Area) -> bool {
        candidate.code != self.code && candidate.parent_code.as_deref() == Some(self.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Area;

    #[test]
    fn blank_parent_code_normalizes_to_none() {
        let area = Area::new("D-1", "Dirección", Some("  ".to_string()));
        assert_eq!(area.parent_code, None);
    }

    #[test]
    fn self_parent_is_not_a_child() {
        let d1 = Area::new("D-1", "Dirección", None);
        let looped = Area::new("D-1", "Dirección", Some("D-1".to_string()));
        assert!(!d1.is_child(&looped));

        let child = Area::new("D-1-A", "Archivo", Some("D-1".to_string()));
        assert!(d1.is_child(&child));
    }
}
