mod registry;
mod unit;

pub use registry::UnitRegistry;
pub use unit::{Unit, UnitId, UnitRecord};
