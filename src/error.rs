use std::fmt;

/// Pipeline stage that produced an error or warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Balance,
    Contiguity,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Balance => write!(f, "population-balance"),
            Stage::Contiguity => write!(f, "contiguity"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the districting pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A unit record is malformed or inconsistent with the rest of the registry.
    #[error("invalid unit '{id}': {reason}")]
    Input { id: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine proved that no assignment satisfies the active constraints.
    #[error("{stage} model is infeasible ({districts} districts, tolerance {tolerance}, {units} units)")]
    InfeasibleModel {
        stage: Stage,
        districts: usize,
        tolerance: f64,
        units: usize,
    },

    /// The engine stopped without a usable answer (unbounded, numerical trouble, ...).
    #[error("{stage} solver failed: {status}")]
    SolverFailure { stage: Stage, status: String },

    /// The time budget ran out before any feasible point was found.
    #[error("{stage} solver hit its time limit without a feasible solution")]
    NoIncumbent { stage: Stage },

    /// A solved model failed a post-solve sanity check.
    #[error("{stage} integrity violation: {detail}")]
    IntegrityViolation { stage: Stage, detail: String },
}

impl Error {
    pub(crate) fn input(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Input { id: id.into(), reason: reason.into() }
    }

    pub(crate) fn integrity(stage: Stage, detail: impl Into<String>) -> Self {
        Error::IntegrityViolation { stage, detail: detail.into() }
    }

    /// Whether only the current stage failed, so a retry with relaxed settings may succeed.
    pub fn is_stage_local(&self) -> bool {
        matches!(self, Error::InfeasibleModel { .. } | Error::NoIncumbent { .. })
    }
}

/// Non-fatal conditions surfaced alongside results.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The stage stopped on its time budget; its assignment is the best incumbent, not a proven optimum.
    SolverTimeout { stage: Stage },

    /// Neighbor references to units outside the registry were dropped.
    DanglingNeighbors { count: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SolverTimeout { stage } => write!(f, "{stage} solver hit its time limit; result is not proven optimal"),
            Warning::DanglingNeighbors { count } => write!(f, "dropped {count} neighbor references to unknown units"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_message_carries_active_constraints() {
        let err = Error::InfeasibleModel { stage: Stage::Contiguity, districts: 4, tolerance: 0.3, units: 3 };
        let msg = err.to_string();
        assert!(msg.contains("contiguity"));
        assert!(msg.contains("4 districts"));
        assert!(msg.contains("3 units"));
        assert!(err.is_stage_local());
    }

    #[test]
    fn integrity_violation_is_not_stage_local() {
        let err = Error::integrity(Stage::Balance, "unit 'A' has no district");
        assert!(!err.is_stage_local());
        assert_eq!(err.to_string(), "population-balance integrity violation: unit 'A' has no district");
    }
}
