use anyhow::Result;
use countymander::{AdjacencyGraph, UnitRegistry};

use crate::cli::{Cli, InspectArgs};

/// Print unit, adjacency and population statistics for a unit file.
pub fn run(_cli: &Cli, args: &InspectArgs) -> Result<()> {
    let registry = UnitRegistry::from_records(super::read_units(&args.units)?)?;
    let graph = AdjacencyGraph::from_registry(&registry);

    let isolated = (0..graph.node_count()).filter(|&u| graph.degree(u) == 0).count();
    let all = (0..graph.node_count()).collect::<Vec<_>>();

    println!("units:              {}", registry.len());
    println!("adjacencies:        {}", graph.edge_count() / 2);
    println!("total population:   {}", registry.total_population());
    println!("isolated units:     {isolated}");
    println!("dangling neighbors: {}", graph.dropped_references());
    println!("connected:          {}", graph.is_connected_subset(&all));

    Ok(())
}
