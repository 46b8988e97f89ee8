mod assignment;

pub use assignment::{ContiguousAssignment, DistrictAssignment, UNASSIGNED};
