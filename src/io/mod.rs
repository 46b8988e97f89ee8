//! File exchange with the data-loading and rendering collaborators.
//!
//! - `csv` - unit tables in, per-unit district tables out
//! - `json` - unit lists in, district summaries and run reports out

mod csv;
mod json;

pub use csv::{read_units_csv, write_assignments_csv};
pub use json::{read_units_json, write_json};
