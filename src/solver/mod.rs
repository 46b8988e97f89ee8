mod backend;
mod balance;
mod contiguity;
mod distance;

use std::time::Duration;

pub(crate) use backend::{MilpModel, MilpSolution, SolveFailure, Var};
pub use backend::{SolveOptions, SolveStatus};
pub use balance::{BalanceParams, solve_balance};
pub use contiguity::{ContiguityParams, solve_contiguity};
pub(crate) use contiguity::solve_contiguity_with_costs;
pub use distance::{DistanceMetric, HaversineCentroid, Uniform, metric_for};
pub(crate) use distance::normalized_matrix;

use crate::{assignment::DistrictAssignment, error::Stage};

/// Outcome of one solver stage.
#[derive(Clone, Debug)]
pub struct StageResult<A = DistrictAssignment> {
    pub stage: Stage,
    pub assignment: A,
    pub status: SolveStatus,
    /// Objective value of the returned assignment.
    pub objective: f64,
    /// Wall time spent in the engine.
    pub elapsed: Duration,
}

impl<A> StageResult<A> {
    pub(crate) fn new(stage: Stage, assignment: A, solution: &MilpSolution) -> Self {
        Self {
            stage,
            assignment,
            status: solution.status,
            objective: solution.objective,
            elapsed: solution.elapsed,
        }
    }

    /// Whether the engine stopped on its time budget instead of proving optimality.
    #[inline] pub fn timed_out(&self) -> bool { self.status == SolveStatus::TimeLimit }
}
