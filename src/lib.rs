#![doc = "Countymander public API"]
mod assignment;
mod config;
mod error;
mod graph;
mod io;
mod pipeline;
mod registry;
mod report;
mod solver;

#[doc(inline)]
pub use assignment::{ContiguousAssignment, DistrictAssignment, UNASSIGNED};

#[doc(inline)]
pub use config::{DistanceKind, PipelineConfig, PopulationBounds};

#[doc(inline)]
pub use error::{Error, Result, Stage, Warning};

#[doc(inline)]
pub use graph::AdjacencyGraph;

#[doc(inline)]
pub use io::{read_units_csv, read_units_json, write_assignments_csv, write_json};

#[doc(inline)]
pub use pipeline::{PipelineOutcome, Redistricter, RunReport, StageReport};

#[doc(inline)]
pub use registry::{Unit, UnitId, UnitRecord, UnitRegistry};

#[doc(inline)]
pub use report::{DistrictSummary, Summary, UnassignedBucket, UnitExport, unit_exports};

#[doc(inline)]
pub use solver::{
    BalanceParams, ContiguityParams, DistanceMetric, HaversineCentroid, SolveOptions, SolveStatus, StageResult, Uniform,
    metric_for, solve_balance, solve_contiguity,
};
