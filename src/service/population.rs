//! Target population resolution.
//!
//! # Responsibility
//! - Turn a population spec (explicit names or an area roster) into a
//!   canonical, deduplicated list of target identities.
//! - Provide the one-level child-area cascade used by matrix axes.
//!
//! # Invariants
//! - Output order is input/roster order; duplicates (by identity key) are
//!   dropped keeping the first occurrence.
//! - Bulk creation never cascades into child areas; only the matrix axis
//!   helper does, and only one level deep.

use crate::model::worker::TargetIdentity;
use crate::repo::directory_repo::{AreaLookup, RosterLookup};
use crate::repo::RepoError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Letters (any script), combining marks, digits, and the separators seen in
// real name input. Mirrors the identifier validation the manual entry form
// applies before a spec ever reaches this resolver.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}\p{N} .,'\-]+$").expect("valid name regex"));

/// Who a scheduling operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopulationSpec {
    /// Free-text employee names from the bulk/manual entry paths.
    ExplicitNames { names: Vec<String> },
    /// Workers drawn from one area's active roster.
    ///
    /// `include_all` overrides `selected_ids` and takes the whole roster.
    AreaRoster {
        area_code: String,
        include_all: bool,
        selected_ids: Vec<i64>,
    },
}

/// Population resolution failure.
#[derive(Debug)]
pub enum PopulationError {
    /// No usable targets remained after normalization/selection.
    EmptyPopulation,
    /// Explicit name list exceeds the configured maximum.
    TooManyNames { count: usize, max: usize },
    /// A name contains characters outside the accepted set.
    InvalidName(String),
    /// The referenced area does not exist.
    AreaNotFound(String),
    /// Directory lookup failure.
    Repo(RepoError),
}

impl Display for PopulationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPopulation => write!(f, "population resolved to zero targets"),
            Self::TooManyNames { count, max } => {
                write!(f, "{count} names exceed the maximum of {max}")
            }
            Self::InvalidName(name) => write!(f, "invalid target name: `{name}`"),
            Self::AreaNotFound(code) => write!(f, "area not found: `{code}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PopulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PopulationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Resolves population specs against the directory.
pub struct PopulationResolver<'a, D> {
    directory: &'a D,
    max_explicit_names: usize,
}

impl<'a, D> PopulationResolver<'a, D>
where
    D: RosterLookup + AreaLookup,
{
    pub fn new(directory: &'a D, max_explicit_names: usize) -> Self {
        Self {
            directory,
            max_explicit_names,
        }
    }

    /// Resolves a spec into the deduplicated target list for bulk creation.
    pub fn resolve(&self, spec: &PopulationSpec) -> Result<Vec<TargetIdentity>, PopulationError> {
        match spec {
            PopulationSpec::ExplicitNames { names } => self.resolve_names(names),
            PopulationSpec::AreaRoster {
                area_code,
                include_all,
                selected_ids,
            } => self.resolve_roster(area_code, *include_all, selected_ids),
        }
    }

    /// Matrix axis: the area's own roster plus each direct child area's
    /// roster, deduplicated by worker key. One level of descent only.
    ///
    /// An empty axis is valid here; a matrix with zero rows is still a
    /// renderable matrix.
    pub fn resolve_area_with_children(
        &self,
        area_code: &str,
    ) -> Result<Vec<TargetIdentity>, PopulationError> {
        if self.directory.area(area_code)?.is_none() {
            return Err(PopulationError::AreaNotFound(area_code.to_string()));
        }

        let mut targets = Vec::new();
        let mut seen = HashSet::new();

        for worker in self.directory.active_workers_for_area(area_code)? {
            if seen.insert(worker.ci.clone()) {
                targets.push(TargetIdentity::from_worker(worker));
            }
        }
        for child in self.directory.child_areas(area_code)? {
            for worker in self.directory.active_workers_for_area(&child.code)? {
                if seen.insert(worker.ci.clone()) {
                    targets.push(TargetIdentity::from_worker(worker));
                }
            }
        }

        Ok(targets)
    }

    fn resolve_names(&self, names: &[String]) -> Result<Vec<TargetIdentity>, PopulationError> {
        let mut targets = Vec::new();
        let mut seen = HashSet::new();

        for raw in names {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            if !NAME_RE.is_match(name) {
                return Err(PopulationError::InvalidName(name.to_string()));
            }
            if seen.insert(name.to_string()) {
                targets.push(TargetIdentity::from_name(name));
            }
        }

        if targets.is_empty() {
            return Err(PopulationError::EmptyPopulation);
        }
        if targets.len() > self.max_explicit_names {
            return Err(PopulationError::TooManyNames {
                count: targets.len(),
                max: self.max_explicit_names,
            });
        }

        Ok(targets)
    }

    fn resolve_roster(
        &self,
        area_code: &str,
        include_all: bool,
        selected_ids: &[i64],
    ) -> Result<Vec<TargetIdentity>, PopulationError> {
        if self.directory.area(area_code)?.is_none() {
            return Err(PopulationError::AreaNotFound(area_code.to_string()));
        }

        let roster = self.directory.active_workers_for_area(area_code)?;

        let mut targets = Vec::new();
        let mut seen = HashSet::new();
        for worker in roster {
            if !include_all && !selected_ids.contains(&worker.id) {
                continue;
            }
            if seen.insert(worker.ci.clone()) {
                targets.push(TargetIdentity::from_worker(worker));
            }
        }

        if targets.is_empty() {
            return Err(PopulationError::EmptyPopulation);
        }

        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::NAME_RE;

    #[test]
    fn name_pattern_accepts_accented_and_compound_names() {
        for name in ["José García", "Ana-María O'Neill", "Núñez Pérez, Pedro 2."] {
            assert!(NAME_RE.is_match(name), "rejected `{name}`");
        }
    }

    #[test]
    fn name_pattern_rejects_control_and_injection_characters() {
        for name in ["a\tb", "x;DROP TABLE", "<script>", "nombre\n"] {
            assert!(!NAME_RE.is_match(name), "accepted `{name}`");
        }
    }
}
