//! CSV format reading and writing operations.

mod read;
mod write;

pub use read::read_units_csv;
pub use write::write_assignments_csv;
