use tracing::info;

use crate::{
    assignment::DistrictAssignment,
    error::{Error, Result, Stage},
    solver::{MilpModel, SolveFailure, SolveOptions, StageResult},
};

/// Problem shape for the population-balance stage.
#[derive(Clone, Copy, Debug)]
pub struct BalanceParams {
    pub num_districts: usize,
    /// Ideal district population.
    pub target: u64,
    /// Deviation tolerance of the run, reported when the model is infeasible.
    pub tolerance: f64,
}

impl BalanceParams {
    fn infeasible(&self, units: usize) -> Error {
        Error::InfeasibleModel { stage: Stage::Balance, districts: self.num_districts, tolerance: self.tolerance, units }
    }
}

/// Assign every unit to one of `num_districts` districts, minimizing the total
/// absolute deviation of district populations from `target`.
///
/// No contiguity or bound constraints apply at this stage. Labels in the
/// returned assignment are 1-indexed.
pub fn solve_balance(populations: &[u64], params: &BalanceParams, options: SolveOptions) -> Result<StageResult> {
    let n = populations.len();
    let k = params.num_districts;
    let target = params.target;
    if k == 0 {
        return Err(Error::InvalidConfig("number of districts must be at least 1".into()));
    }
    info!(units = n, districts = k, target, "building population-balance model");

    let mut model = MilpModel::new("population-balance");

    // x[i * k + j] = 1 iff unit i belongs to district j.
    let x = (0..n * k).map(|_| model.add_binary()).collect::<Vec<_>>();
    let deviation = (0..k).map(|_| model.add_continuous(0.0, None)).collect::<Vec<_>>();

    let objective = model.sum(deviation.iter().copied());
    model.set_objective(objective);

    for i in 0..n {
        let one_district = model.sum((0..k).map(|j| x[i * k + j])).eq(1.0);
        model.add_constraint(one_district);
    }

    let target = target as f64;
    for j in 0..k {
        let members = (0..n).map(|i| (populations[i] as f64, x[i * k + j]));

        // pop_j - T <= d_j  and  T - pop_j <= d_j
        let over = model.linear(members.clone().chain([(-1.0, deviation[j])]), -target).leq(0.0);
        let under = model.linear(members.map(|(p, var)| (-p, var)).chain([(-1.0, deviation[j])]), target).leq(0.0);
        model.add_constraint(over);
        model.add_constraint(under);
    }

    let solution = model.solve(options).map_err(|failure| match failure {
        SolveFailure::Infeasible => params.infeasible(n),
        SolveFailure::Failed(status) => Error::SolverFailure { stage: Stage::Balance, status },
    })?;

    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let chosen = (0..k).filter(|&j| solution.is_set(x[i * k + j])).collect::<Vec<_>>();
        match chosen.as_slice() {
            [j] => labels.push(Some(*j as u32 + 1)),
            _ if !solution.status.is_optimal() => return Err(Error::NoIncumbent { stage: Stage::Balance }),
            _ => return Err(Error::integrity(
                Stage::Balance,
                format!("unit at position {i} is assigned to {} districts", chosen.len()),
            )),
        }
    }

    let assignment = DistrictAssignment::from_labels(k as u32, labels);
    info!(status = %solution.status, total_deviation = solution.objective, "population-balance stage finished");

    Ok(StageResult::new(Stage::Balance, assignment, &solution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolveStatus;

    fn params(target: u64, num_districts: usize) -> BalanceParams {
        BalanceParams { num_districts, target, tolerance: 0.3 }
    }

    fn total_deviation(result: &StageResult, populations: &[u64], target: u64) -> u64 {
        result.assignment.district_populations(populations).iter()
            .map(|&p| p.abs_diff(target))
            .sum()
    }

    #[test]
    fn equal_units_get_their_own_district() {
        let populations = [100, 100, 100];
        let result = solve_balance(&populations, &params(100, 3), SolveOptions::default()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(result.assignment.is_total());
        assert_eq!(result.assignment.district_populations(&populations), vec![100, 100, 100]);
        assert!(result.objective.abs() < 1e-6);
    }

    #[test]
    fn balances_uneven_units() {
        // 60 + 40 = 70 + 30 = 100
        let populations = [60, 70, 40, 30];
        let result = solve_balance(&populations, &params(100, 2), SolveOptions::default()).unwrap();

        assert_eq!(total_deviation(&result, &populations, 100), 0);
        assert_eq!(result.assignment.district_populations(&populations).iter().sum::<u64>(), 200);
    }

    #[test]
    fn objective_matches_unavoidable_deviation() {
        // Best split of {5, 5, 5} into two districts around target 7 is 10 | 5, deviation 3 + 2.
        let populations = [5, 5, 5];
        let result = solve_balance(&populations, &params(7, 2), SolveOptions::default()).unwrap();

        assert!((result.objective - 5.0).abs() < 1e-6);
        assert_eq!(total_deviation(&result, &populations, 7), 5);
    }

    #[test]
    fn more_districts_than_units_leaves_districts_empty() {
        let populations = [10, 20];
        let result = solve_balance(&populations, &params(7, 3), SolveOptions::default()).unwrap();

        assert!(result.assignment.is_total());
        let sizes = result.assignment.members().iter().map(Vec::len).collect::<Vec<_>>();
        assert_eq!(sizes.iter().sum::<usize>(), 2);
    }

    #[test]
    fn zero_districts_is_rejected() {
        assert!(matches!(solve_balance(&[1], &params(1, 0), SolveOptions::default()), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn infeasible_error_names_the_configured_tolerance() {
        let params = BalanceParams { num_districts: 4, target: 25, tolerance: 0.05 };
        match params.infeasible(3) {
            Error::InfeasibleModel { stage, districts, tolerance, units } => {
                assert_eq!(stage, Stage::Balance);
                assert_eq!((districts, units), (4, 3));
                assert_eq!(tolerance, 0.05);
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
