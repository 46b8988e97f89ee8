use std::path::PathBuf;

/// Redistricting CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "countymander", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Validate a unit file and report graph statistics
    Inspect(InspectArgs),

    /// Partition units into contiguous, population-balanced districts
    Redistrict(RedistrictArgs),
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Unit list (.json or .csv)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub units: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum DistanceArg {
    Uniform,
    Haversine,
}

#[derive(clap::Args, Debug)]
pub struct RedistrictArgs {
    /// Unit list (.json or .csv)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub units: PathBuf,

    /// Output plan file, defaults to "./plan.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output JSON report with per-district summaries
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub summary: Option<PathBuf>,

    /// Pipeline config file (JSON); flags below override its fields
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Number of districts
    #[arg(short, long)]
    pub districts: Option<usize>,

    /// Allowed population deviation as a fraction, e.g. 0.30
    #[arg(long)]
    pub deviation: Option<f64>,

    /// Time budget per solver stage, in seconds
    #[arg(long, conflicts_with = "no_time_limit")]
    pub time_limit: Option<f64>,

    /// Let each solver stage run until optimality
    #[arg(long)]
    pub no_time_limit: bool,

    /// Cost metric for the contiguity objective
    #[arg(long, value_enum)]
    pub distance: Option<DistanceArg>,

    /// Do not enforce population bounds in the contiguity stage
    #[arg(long)]
    pub no_bounds: bool,
}
