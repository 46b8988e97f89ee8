use std::{fs::File, io::{BufReader, BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::registry::UnitRecord;

/// Read a JSON array of unit records.
pub fn read_units_json(path: &Path) -> Result<Vec<UnitRecord>> {
    let file = File::open(path)
        .with_context(|| format!("[io::json::read_units_json] Failed to open JSON file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::json::read_units_json] Failed to parse unit records from {:?}", path))
}

/// Write any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::json::write_json] Failed to create JSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("[io::json::write_json] Failed to write JSON to {:?}", path))?;
    writer.flush()
        .with_context(|| format!("[io::json::write_json] Failed to flush {:?}", path))
}
