//! Attendance state codes and the injected state catalog.
//!
//! # Responsibility
//! - Define the short-code identity of an attendance outcome.
//! - Carry the code→label table plus the two designated default codes
//!   (weekend rest, default present) as injected configuration.
//!
//! # Invariants
//! - `rest_day` and `default_present` always name codes present in the
//!   catalog.
//! - The catalog never contains duplicate codes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Short attendance state code, e.g. `"AP"` for "Asistió puntual".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateCode(pub String);

impl StateCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StateCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog entry: code plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
    pub code: StateCode,
    pub label: String,
}

/// Catalog construction error.
#[derive(Debug)]
pub enum CatalogError {
    /// A code appears more than once in the entry list.
    DuplicateCode(StateCode),
    /// A designated default code is not in the entry list.
    UnknownDefault(StateCode),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCode(code) => write!(f, "duplicate state code `{code}`"),
            Self::UnknownDefault(code) => {
                write!(f, "default state code `{code}` is not in the catalog")
            }
        }
    }
}

impl Error for CatalogError {}

/// The set of attendance states this deployment recognizes.
///
/// Injected wherever states are interpreted, so tests and alternate
/// deployments can substitute their own state sets instead of depending on a
/// process-wide table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCatalog {
    states: Vec<StateDef>,
    rest_day: StateCode,
    default_present: StateCode,
}

impl StateCatalog {
    /// Builds a catalog, validating code uniqueness and default membership.
    pub fn new(
        states: Vec<StateDef>,
        rest_day: StateCode,
        default_present: StateCode,
    ) -> Result<Self, CatalogError> {
        for (index, def) in states.iter().enumerate() {
            if states[..index].iter().any(|other| other.code == def.code) {
                return Err(CatalogError::DuplicateCode(def.code.clone()));
            }
        }
        for default in [&rest_day, &default_present] {
            if !states.iter().any(|def| &def.code == default) {
                return Err(CatalogError::UnknownDefault(default.clone()));
            }
        }
        Ok(Self {
            states,
            rest_day,
            default_present,
        })
    }

    /// The state set shipped with the source attendance system.
    pub fn standard() -> Self {
        let states = [
            ("AP", "Asistió puntual"),
            ("AT", "Llegó tarde"),
            ("AJ", "Ausencia justificada"),
            ("AI", "Ausencia injustificada"),
            ("V", "Vacaciones"),
            ("CM", "Certificado médico"),
            ("DP", "Descanso programado"),
        ]
        .into_iter()
        .map(|(code, label)| StateDef {
            code: StateCode::new(code),
            label: label.to_string(),
        })
        .collect();

        // Membership of both defaults is guaranteed by the table above.
        Self::new(states, StateCode::new("DP"), StateCode::new("AP"))
            .expect("standard catalog is internally consistent")
    }

    pub fn contains(&self, code: &StateCode) -> bool {
        self.states.iter().any(|def| &def.code == code)
    }

    pub fn label(&self, code: &StateCode) -> Option<&str> {
        self.states
            .iter()
            .find(|def| &def.code == code)
            .map(|def| def.label.as_str())
    }

    /// Code materialized for weekend cells with no record.
    pub fn rest_day(&self) -> &StateCode {
        &self.rest_day
    }

    /// Code materialized for weekday cells with no record.
    pub fn default_present(&self) -> &StateCode {
        &self.default_present
    }

    pub fn states(&self) -> &[StateDef] {
        &self.states
    }
}
