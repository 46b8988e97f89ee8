//! Thin binding over the `good_lp` modelling layer: build variables, add
//! constraints, set the objective, solve under a time budget, read values back.

use std::{fmt, time::{Duration, Instant}};

use good_lp::{Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, variable};
use serde::Serialize;
use tracing::info;

#[cfg(not(any(feature = "highs", feature = "microlp")))]
compile_error!("enable one MILP engine feature: `highs` or `microlp`");

/// Handle to a variable registered in a [`MilpModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Var(usize);

/// How the engine finished a successful solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// The time budget ran out; the result is the best incumbent.
    TimeLimit,
    /// Stopped at the configured optimality gap.
    GapLimit,
}

impl SolveStatus {
    #[inline] pub fn is_optimal(&self) -> bool { matches!(self, SolveStatus::Optimal) }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::TimeLimit => write!(f, "time limit reached"),
            SolveStatus::GapLimit => write!(f, "gap limit reached"),
        }
    }
}

/// Why a solve produced no solution at all.
#[derive(Debug, PartialEq)]
pub(crate) enum SolveFailure {
    Infeasible,
    Failed(String),
}

/// Engine settings for a single solve.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveOptions {
    /// Wall-clock budget; the engine returns its best incumbent when it runs out.
    pub time_limit: Option<Duration>,
}

/// Values read back from a solved model.
#[derive(Debug)]
pub(crate) struct MilpSolution {
    pub(crate) status: SolveStatus,
    pub(crate) objective: f64,
    pub(crate) elapsed: Duration,
    values: Vec<f64>,
}

impl MilpSolution {
    #[cfg(test)]
    pub(crate) fn value(&self, var: Var) -> f64 { self.values[var.0] }

    /// Read a binary variable, rounding away solver tolerance.
    #[inline] pub(crate) fn is_set(&self, var: Var) -> bool { self.values[var.0] > 0.5 }
}

/// A minimisation MILP under construction.
pub(crate) struct MilpModel {
    name: &'static str,
    problem: ProblemVariables,
    vars: Vec<Variable>,
    objective: Expression,
    constraints: Vec<Constraint>,
}

impl MilpModel {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            problem: ProblemVariables::new(),
            vars: Vec::new(),
            objective: Expression::from(0.0),
            constraints: Vec::new(),
        }
    }

    fn register(&mut self, variable: Variable) -> Var {
        self.vars.push(variable);
        Var(self.vars.len() - 1)
    }

    /// Add a 0/1 variable.
    pub(crate) fn add_binary(&mut self) -> Var {
        let variable = self.problem.add(variable().binary());
        self.register(variable)
    }

    /// Add a continuous variable with a lower and optional upper bound.
    pub(crate) fn add_continuous(&mut self, lower: f64, upper: Option<f64>) -> Var {
        let definition = match upper {
            Some(upper) => variable().min(lower).max(upper),
            None => variable().min(lower),
        };
        let variable = self.problem.add(definition);
        self.register(variable)
    }

    /// Build `Σ coef · var` (plus a constant) from registered variables.
    pub(crate) fn linear(&self, terms: impl IntoIterator<Item = (f64, Var)>, constant: f64) -> Expression {
        let mut expr = Expression::from(constant);
        for (coef, var) in terms {
            expr.add_mul(coef, self.vars[var.0]);
        }
        expr
    }

    /// Build `Σ var` over registered variables.
    pub(crate) fn sum(&self, vars: impl IntoIterator<Item = Var>) -> Expression {
        self.linear(vars.into_iter().map(|var| (1.0, var)), 0.0)
    }

    pub(crate) fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn set_objective(&mut self, objective: Expression) {
        self.objective = objective;
    }

    #[inline] pub(crate) fn num_variables(&self) -> usize { self.vars.len() }

    #[inline] pub(crate) fn num_constraints(&self) -> usize { self.constraints.len() }

    /// Hand the model to the engine and read back every variable.
    pub(crate) fn solve(self, options: SolveOptions) -> Result<MilpSolution, SolveFailure> {
        info!(
            model = self.name,
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            time_limit = ?options.time_limit,
            "solving MILP"
        );

        let start = Instant::now();
        let Self { name, problem, vars, objective, constraints } = self;

        let (status, objective_value, values) = run_engine(problem, objective, constraints, vars, options)?;

        let elapsed = start.elapsed();
        info!(model = name, %status, objective = objective_value, elapsed = ?elapsed, "solve finished");

        Ok(MilpSolution { status, objective: objective_value, elapsed, values })
    }
}

type EngineOutput = (SolveStatus, f64, Vec<f64>);

impl From<ResolutionError> for SolveFailure {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => SolveFailure::Infeasible,
            other => SolveFailure::Failed(other.to_string()),
        }
    }
}

fn read_back<S: Solution>(solution: &S, objective: &Expression, vars: &[Variable]) -> Result<EngineOutput, SolveFailure> {
    let status = status_of(solution.status())?;
    let values = vars.iter().map(|&v| solution.value(v)).collect();
    Ok((status, objective.eval_with(solution), values))
}

/// Map the engine's stop reason. Anything not listed is treated as a failed
/// solve, since it proves neither optimality nor a usable incumbent.
fn status_of(status: good_lp::solvers::SolutionStatus) -> Result<SolveStatus, SolveFailure> {
    use good_lp::solvers::SolutionStatus;

    match status {
        SolutionStatus::Optimal => Ok(SolveStatus::Optimal),
        SolutionStatus::TimeLimit => Ok(SolveStatus::TimeLimit),
        SolutionStatus::GapLimit => Ok(SolveStatus::GapLimit),
        #[allow(unreachable_patterns)]
        other => Err(SolveFailure::Failed(format!("unrecognized engine status {other:?}"))),
    }
}

#[cfg(feature = "highs")]
fn run_engine(
    problem: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    vars: Vec<Variable>,
    options: SolveOptions,
) -> Result<EngineOutput, SolveFailure> {
    use good_lp::solvers::{WithTimeLimit, highs::highs};

    let mut model = problem.minimise(objective.clone()).using(highs);
    if let Some(limit) = options.time_limit {
        model = model.with_time_limit(limit.as_secs_f64());
    }
    for constraint in constraints {
        model.add_constraint(constraint);
    }

    let solution = model.solve()?;
    read_back(&solution, &objective, &vars)
}

#[cfg(all(feature = "microlp", not(feature = "highs")))]
fn run_engine(
    problem: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    vars: Vec<Variable>,
    options: SolveOptions,
) -> Result<EngineOutput, SolveFailure> {
    use good_lp::solvers::microlp::microlp;

    if options.time_limit.is_some() {
        tracing::warn!("the microlp engine does not support time limits; solving to optimality");
    }

    let mut model = problem.minimise(objective.clone()).using(microlp);
    for constraint in constraints {
        model.add_constraint(constraint);
    }

    let solution = model.solve()?;
    read_back(&solution, &objective, &vars)
}
