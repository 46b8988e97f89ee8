mod summary;

pub use summary::{DistrictSummary, Summary, UnassignedBucket, UnitExport, unit_exports};
