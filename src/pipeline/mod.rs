mod pipeline;

pub use pipeline::{PipelineOutcome, Redistricter, RunReport, StageReport};
