use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    assignment::{ContiguousAssignment, DistrictAssignment},
    config::{PipelineConfig, PopulationBounds},
    error::{Result, Stage, Warning},
    graph::AdjacencyGraph,
    registry::UnitRegistry,
    report::{Summary, UnitExport, unit_exports},
    solver::{self, BalanceParams, ContiguityParams, DistanceMetric, SolveOptions, SolveStatus, StageResult},
};

/// Runs the two-stage districting pipeline over a fixed set of units.
///
/// The registry and its adjacency graph are built once and shared read-only by
/// both stages; each stage returns a fresh assignment.
#[derive(Clone, Debug)]
pub struct Redistricter {
    registry: Arc<UnitRegistry>,
    graph: Arc<AdjacencyGraph>,
    config: PipelineConfig,
    bounds: PopulationBounds,
}

impl Redistricter {
    /// Validate the config, build the adjacency graph and check every unit
    /// against the configured distance metric.
    pub fn new(registry: impl Into<Arc<UnitRegistry>>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let registry: Arc<UnitRegistry> = registry.into();
        let graph = Arc::new(AdjacencyGraph::from_registry(&registry));
        let bounds = PopulationBounds::new(registry.total_population(), config.num_districts, config.deviation);

        info!(
            units = registry.len(),
            edges = graph.edge_count() / 2,
            total_population = bounds.total,
            target = bounds.target,
            lower = bounds.lower,
            upper = bounds.upper,
            "prepared districting problem"
        );
        if graph.dropped_references() > 0 {
            warn!(count = graph.dropped_references(), "dropped neighbor references to unknown units");
        }

        let metric = solver::metric_for(config.distance);
        registry.units().iter().try_for_each(|unit| metric.validate(unit))?;

        Ok(Self { registry, graph, config, bounds })
    }

    #[inline] pub fn registry(&self) -> &UnitRegistry { &self.registry }

    #[inline] pub fn graph(&self) -> &AdjacencyGraph { &self.graph }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    #[inline] pub fn bounds(&self) -> PopulationBounds { self.bounds }

    fn options(&self) -> SolveOptions {
        SolveOptions { time_limit: self.config.time_limit() }
    }

    fn balance_params(&self) -> BalanceParams {
        BalanceParams {
            num_districts: self.config.num_districts,
            target: self.bounds.target,
            tolerance: self.config.deviation,
        }
    }

    fn contiguity_params(&self) -> ContiguityParams {
        ContiguityParams {
            num_districts: self.config.num_districts,
            bounds: self.config.enforce_bounds.then_some(self.bounds),
            tolerance: self.config.deviation,
        }
    }

    /// Population-balance stage: every unit to one district, minimizing total deviation from the target.
    pub fn run_balance(&self) -> Result<StageResult> {
        solver::solve_balance(&self.registry.populations(), &self.balance_params(), self.options())
    }

    /// Contiguity stage: reassign units to connected districts around K centers.
    pub fn run_contiguity<D: DistanceMetric + ?Sized>(&self, metric: &D) -> Result<StageResult<ContiguousAssignment>> {
        solver::solve_contiguity(&self.registry, &self.graph, &self.contiguity_params(), metric, self.options())
    }

    /// Run both stages with the given distance metric.
    ///
    /// The cost matrix is built before either stage is solved, so a metric
    /// that cannot measure some unit fails without spending a solve.
    pub fn run_with<D: DistanceMetric + ?Sized>(&self, metric: &D) -> Result<PipelineOutcome> {
        self.registry.units().iter().try_for_each(|unit| metric.validate(unit))?;
        let costs = solver::normalized_matrix(&self.registry, metric)?;

        let balance = self.run_balance()?;
        let contiguity = solver::solve_contiguity_with_costs(
            &self.registry, &self.graph, &self.contiguity_params(), &costs, self.options(),
        )?;

        let outcome = PipelineOutcome::new(self.bounds, balance, contiguity, self.graph.dropped_references());
        info!(changed_units = outcome.changed_units, "contiguity stage relabelled units");
        outcome.warnings.iter().for_each(|w| warn!("{w}"));

        Ok(outcome)
    }

    /// Run both stages with the distance metric named in the config.
    pub fn run(&self) -> Result<PipelineOutcome> {
        self.run_with(solver::metric_for(self.config.distance).as_ref())
    }
}

/// Results of a full pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub bounds: PopulationBounds,
    pub balance: StageResult,
    pub contiguity: StageResult<ContiguousAssignment>,
    /// Units whose label differs between the balance and contiguity stages.
    pub changed_units: usize,
    pub warnings: Vec<Warning>,
}

impl PipelineOutcome {
    /// Combine stage results, deriving warnings and the relabelled-unit count.
    pub fn new(
        bounds: PopulationBounds,
        balance: StageResult,
        contiguity: StageResult<ContiguousAssignment>,
        dropped_references: usize,
    ) -> Self {
        let mut warnings = Vec::new();
        if dropped_references > 0 {
            warnings.push(Warning::DanglingNeighbors { count: dropped_references });
        }
        if balance.timed_out() { warnings.push(Warning::SolverTimeout { stage: Stage::Balance }) }
        if contiguity.timed_out() { warnings.push(Warning::SolverTimeout { stage: Stage::Contiguity }) }

        let changed_units = contiguity.assignment.assignment().changed_from(&balance.assignment);
        Self { bounds, balance, contiguity, changed_units, warnings }
    }

    /// The final (contiguous) assignment.
    #[inline] pub fn assignment(&self) -> &DistrictAssignment { self.contiguity.assignment.assignment() }

    /// Whether both stages proved optimality.
    pub fn is_optimal(&self) -> bool {
        self.balance.status.is_optimal() && self.contiguity.status.is_optimal()
    }

    pub fn summary(&self, registry: &UnitRegistry) -> Summary { Summary::new(registry, self.assignment()) }

    pub fn unit_exports(&self, registry: &UnitRegistry) -> Vec<UnitExport> { unit_exports(registry, self.assignment()) }

    /// Serializable record of the run.
    pub fn report(&self, registry: &UnitRegistry) -> RunReport {
        let stage = |status: SolveStatus, objective: f64, elapsed: std::time::Duration| StageReport {
            status,
            objective,
            elapsed_secs: elapsed.as_secs_f64(),
        };

        RunReport {
            bounds: self.bounds,
            balance: stage(self.balance.status, self.balance.objective, self.balance.elapsed),
            balance_deviation: Summary::new(registry, &self.balance.assignment).total_deviation(self.bounds.target),
            contiguity: stage(self.contiguity.status, self.contiguity.objective, self.contiguity.elapsed),
            centers: self.contiguity.assignment.centers().iter().map(|&c| registry[c].id().to_string()).collect(),
            changed_units: self.changed_units,
            warnings: self.warnings.clone(),
            summary: self.summary(registry),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    pub status: SolveStatus,
    pub objective: f64,
    pub elapsed_secs: f64,
}

/// JSON-friendly view of a [`PipelineOutcome`].
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub bounds: PopulationBounds,
    pub balance: StageReport,
    pub balance_deviation: u64,
    pub contiguity: StageReport,
    /// Center unit ids; entry `d - 1` is the center of district `d`.
    pub centers: Vec<String>,
    pub changed_units: usize,
    pub warnings: Vec<Warning>,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::DistanceKind,
        error::Error,
        registry::{Unit, UnitRecord},
    };

    fn pair() -> UnitRegistry {
        UnitRegistry::from_records(vec![
            UnitRecord::new("A", "Alpha", 10, &["B"]),
            UnitRecord::new("B", "Beta", 10, &["A"]),
        ]).unwrap()
    }

    fn stage<A>(stage: Stage, assignment: A, status: SolveStatus) -> StageResult<A> {
        StageResult { stage, assignment, status, objective: 0.0, elapsed: Duration::ZERO }
    }

    fn outcome(balance: SolveStatus, contiguity: SolveStatus, dropped: usize) -> PipelineOutcome {
        let split = DistrictAssignment::from_labels(2, vec![Some(1), Some(2)]);
        let swapped = DistrictAssignment::from_labels(2, vec![Some(2), Some(1)]);
        PipelineOutcome::new(
            PopulationBounds::new(20, 2, 0.3),
            stage(Stage::Balance, split, balance),
            stage(Stage::Contiguity, ContiguousAssignment { assignment: swapped, centers: vec![1, 0] }, contiguity),
            dropped,
        )
    }

    #[test]
    fn haversine_without_centroids_is_rejected_at_construction() {
        let config = PipelineConfig { distance: DistanceKind::Haversine, ..PipelineConfig::new(2) };

        match Redistricter::new(pair(), config) {
            Err(Error::Input { id, reason }) => {
                assert_eq!(id, "A");
                assert!(reason.contains("centroid"));
            }
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn broken_metric_fails_before_any_stage_runs() {
        // Three districts over two units would fail the contiguity pre-check;
        // the metric error surfaces first because costs are built up front.
        let pipeline = Redistricter::new(pair(), PipelineConfig::new(3)).unwrap();
        let broken = |_: &Unit, _: &Unit| f64::NAN;

        assert!(matches!(pipeline.run_with(&broken), Err(Error::Input { .. })));
    }

    #[test]
    fn time_limited_stage_produces_timeout_warning() {
        let outcome = outcome(SolveStatus::Optimal, SolveStatus::TimeLimit, 0);

        assert!(!outcome.is_optimal());
        assert!(outcome.contiguity.timed_out());
        assert_eq!(outcome.warnings, vec![Warning::SolverTimeout { stage: Stage::Contiguity }]);
        assert_eq!(outcome.changed_units, 2);
    }

    #[test]
    fn warnings_follow_stage_order() {
        let outcome = outcome(SolveStatus::TimeLimit, SolveStatus::TimeLimit, 3);

        assert_eq!(outcome.warnings, vec![
            Warning::DanglingNeighbors { count: 3 },
            Warning::SolverTimeout { stage: Stage::Balance },
            Warning::SolverTimeout { stage: Stage::Contiguity },
        ]);
    }

    #[test]
    fn optimal_stages_produce_no_warnings() {
        let outcome = outcome(SolveStatus::Optimal, SolveStatus::GapLimit, 0);

        assert!(outcome.warnings.is_empty());
        assert!(!outcome.is_optimal());
    }

    #[test]
    fn report_carries_timeout_status() {
        let registry = pair();
        let report = serde_json::to_value(outcome(SolveStatus::Optimal, SolveStatus::TimeLimit, 0).report(&registry)).unwrap();

        assert_eq!(report["contiguity"]["status"], "time_limit");
        assert_eq!(report["warnings"][0]["kind"], "solver_timeout");
        assert_eq!(report["centers"], serde_json::json!(["B", "A"]));
    }
}
