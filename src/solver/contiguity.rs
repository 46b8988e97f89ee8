use ndarray::Array2;
use tracing::{debug, info};

use crate::{
    assignment::{ContiguousAssignment, DistrictAssignment},
    config::PopulationBounds,
    error::{Error, Result, Stage},
    graph::AdjacencyGraph,
    registry::UnitRegistry,
    solver::{DistanceMetric, MilpModel, MilpSolution, SolveFailure, SolveOptions, StageResult, Var, distance},
};

/// Problem shape for the contiguity stage.
#[derive(Clone, Copy, Debug)]
pub struct ContiguityParams {
    pub num_districts: usize,
    /// Hard bounds on district population; `None` leaves populations free.
    pub bounds: Option<PopulationBounds>,
    /// Tolerance the bounds were derived from, reported when the model is infeasible.
    pub tolerance: f64,
}

/// Reassign units to `num_districts` centers so that every district is connected.
///
/// Each unit `j` may become a center; `x[i][j] = 1` assigns unit `i` to center `j`
/// and `x[j][j] = 1` marks `j` active. Connectivity uses one flow commodity per
/// potential center: the center ships one unit of flow to every other member,
/// and flow may only pass through units assigned to that center.
///
/// Districts are numbered by the registry order of their centers.
pub fn solve_contiguity<D: DistanceMetric + ?Sized>(
    registry: &UnitRegistry,
    graph: &AdjacencyGraph,
    params: &ContiguityParams,
    metric: &D,
    options: SolveOptions,
) -> Result<StageResult<ContiguousAssignment>> {
    let costs = distance::normalized_matrix(registry, metric)?;
    solve_contiguity_with_costs(registry, graph, params, &costs, options)
}

/// [`solve_contiguity`] over a cost matrix already built by `distance::normalized_matrix`.
pub(crate) fn solve_contiguity_with_costs(
    registry: &UnitRegistry,
    graph: &AdjacencyGraph,
    params: &ContiguityParams,
    dist: &Array2<f64>,
    options: SolveOptions,
) -> Result<StageResult<ContiguousAssignment>> {
    let n = registry.len();
    let k = params.num_districts;
    if graph.node_count() != n || dist.dim() != (n, n) {
        return Err(Error::InvalidConfig(format!(
            "graph has {} nodes and cost matrix is {:?}, but the registry has {n} units",
            graph.node_count(), dist.dim(),
        )));
    }

    let infeasible = || Error::InfeasibleModel { stage: Stage::Contiguity, districts: k, tolerance: params.tolerance, units: n };
    if k == 0 {
        return Err(Error::InvalidConfig("number of districts must be at least 1".into()));
    }
    if k > n {
        debug!(districts = k, units = n, "not enough units to open every center");
        return Err(infeasible());
    }

    info!(units = n, districts = k, edges = graph.edge_count(), bounds = ?params.bounds, "building contiguity model");

    let populations = registry.populations();
    let mut model = MilpModel::new("contiguity");

    // x[i * n + j] = 1 iff unit i is assigned to center j.
    let x = (0..n * n).map(|_| model.add_binary()).collect::<Vec<_>>();

    let objective = model.linear(
        (0..n).flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| (dist[[i, j]].powi(2) * populations[i] as f64, x[i * n + j]))
            .filter(|&(cost, _)| cost != 0.0),
        0.0,
    );
    model.set_objective(objective);

    // (1) every unit has exactly one center
    for i in 0..n {
        let one_center = model.sum((0..n).map(|j| x[i * n + j])).eq(1.0);
        model.add_constraint(one_center);
    }

    // (2) exactly K active centers
    let centers = model.sum((0..n).map(|j| x[j * n + j])).eq(k as f64);
    model.add_constraint(centers);

    // (3) only active centers take members
    for j in 0..n {
        for i in (0..n).filter(|&i| i != j) {
            let active = model.linear([(1.0, x[i * n + j]), (-1.0, x[j * n + j])], 0.0).leq(0.0);
            model.add_constraint(active);
        }
    }

    if let Some(bounds) = params.bounds {
        for j in 0..n {
            let members = (0..n).map(|i| (populations[i] as f64, x[i * n + j]));
            let lower = model.linear(members.clone().chain([(-(bounds.lower as f64), x[j * n + j])]), 0.0).geq(0.0);
            let upper = model.linear(members.chain([(-(bounds.upper as f64), x[j * n + j])]), 0.0).leq(0.0);
            model.add_constraint(lower);
            model.add_constraint(upper);
        }
    }

    add_flow_constraints(&mut model, graph, &x, n);

    let solution = model.solve(options).map_err(|failure| match failure {
        SolveFailure::Infeasible => infeasible(),
        SolveFailure::Failed(status) => Error::SolverFailure { stage: Stage::Contiguity, status },
    })?;

    let contiguous = read_assignment(&solution, graph, &populations, &x, params)?;
    info!(status = %solution.status, objective = solution.objective, "contiguity stage finished");

    Ok(StageResult::new(Stage::Contiguity, contiguous, &solution))
}

/// Single-commodity flow per potential center `j` over directed edges `(u, v)`:
///
/// - every member `i != j` absorbs one unit net: `in_j(i) - out_j(i) = x[i][j]`
/// - the center supplies the rest of its district: `out_j(j) - in_j(j) = Σ_{i != j} x[i][j]`
/// - no flow re-enters the center
/// - `f_j(u, v) <= (N - 1) · x[u][j]` and `f_j(u, v) <= (N - 1) · x[v][j]`
fn add_flow_constraints(model: &mut MilpModel, graph: &AdjacencyGraph, x: &[Var], n: usize) {
    let num_edges = graph.edge_count();
    let capacity = n.saturating_sub(1) as f64;

    let mut incoming = vec![Vec::new(); n];
    let mut outgoing = vec![Vec::new(); n];
    let edges = graph.directed_edges().collect::<Vec<_>>();
    for &(e, u, v) in &edges {
        outgoing[u].push(e);
        incoming[v].push(e);
    }

    for j in 0..n {
        let flow = edges.iter()
            .map(|&(_, _, v)| (v != j).then(|| model.add_continuous(0.0, Some(capacity))))
            .collect::<Vec<Option<Var>>>();
        debug_assert!(flow.len() == num_edges);

        for &(e, u, v) in &edges {
            let Some(f) = flow[e] else { continue };
            let from_member = model.linear([(1.0, f), (-capacity, x[u * n + j])], 0.0).leq(0.0);
            let into_member = model.linear([(1.0, f), (-capacity, x[v * n + j])], 0.0).leq(0.0);
            model.add_constraint(from_member);
            model.add_constraint(into_member);
        }

        for i in 0..n {
            let inflow = incoming[i].iter().filter_map(|&e| flow[e]).map(|f| (1.0, f));
            let outflow = outgoing[i].iter().filter_map(|&e| flow[e]).map(|f| (-1.0, f));

            let balance = if i == j {
                // out - in - Σ_{m != j} x[m][j] = 0
                let members = (0..n).filter(|&m| m != j).map(|m| (-1.0, x[m * n + j]));
                model.linear(outflow.map(|(c, f)| (-c, f)).chain(inflow.map(|(c, f)| (-c, f))).chain(members), 0.0)
            } else {
                // in - out - x[i][j] = 0
                model.linear(inflow.chain(outflow).chain([(-1.0, x[i * n + j])]), 0.0)
            };
            model.add_constraint(balance.eq(0.0));
        }
    }
}

/// Turn solved `x` values into districts, checking every structural invariant.
fn read_assignment(
    solution: &MilpSolution,
    graph: &AdjacencyGraph,
    populations: &[u64],
    x: &[Var],
    params: &ContiguityParams,
) -> Result<ContiguousAssignment> {
    let n = populations.len();
    let k = params.num_districts;

    // Garbage values after a time-limited stop mean no incumbent was found.
    let violation = |detail: String| {
        if solution.status.is_optimal() { Error::integrity(Stage::Contiguity, detail) } else { Error::NoIncumbent { stage: Stage::Contiguity } }
    };

    let centers = (0..n).filter(|&j| solution.is_set(x[j * n + j])).collect::<Vec<_>>();
    if centers.len() != k {
        return Err(violation(format!("{} active centers, expected {k}", centers.len())));
    }

    let mut district_of_center = vec![None; n];
    centers.iter().enumerate().for_each(|(d, &j)| district_of_center[j] = Some(d as u32 + 1));

    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let chosen = (0..n).filter(|&j| solution.is_set(x[i * n + j])).collect::<Vec<_>>();
        let [j] = chosen.as_slice() else {
            return Err(violation(format!("unit at position {i} is assigned to {} centers", chosen.len())));
        };
        let Some(district) = district_of_center[*j] else {
            return Err(violation(format!("unit at position {i} is assigned to inactive center at position {j}")));
        };
        labels.push(Some(district));
    }

    let assignment = DistrictAssignment::from_labels(k as u32, labels);

    for (d, members) in assignment.members().iter().enumerate() {
        if !graph.is_connected_subset(members) {
            return Err(violation(format!("district {} is not connected", d + 1)));
        }
    }

    if let Some(bounds) = params.bounds {
        for (d, &population) in assignment.district_populations(populations).iter().enumerate() {
            if !bounds.contains(population) {
                return Err(violation(format!(
                    "district {} population {population} outside [{}, {}]", d + 1, bounds.lower, bounds.upper,
                )));
            }
        }
    }

    Ok(ContiguousAssignment { assignment, centers })
}
