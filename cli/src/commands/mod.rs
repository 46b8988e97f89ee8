pub mod inspect;
pub mod redistrict;

use std::path::Path;

use anyhow::{Result, bail};
use countymander::{UnitRecord, read_units_csv, read_units_json};

/// Read unit records, picking the format from the file extension.
pub fn read_units(path: &Path) -> Result<Vec<UnitRecord>> {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("json") => read_units_json(path),
        Some("csv") => read_units_csv(path),
        _ => bail!("[commands::read_units] Unsupported unit file {:?}; expected .json or .csv", path),
    }
}
