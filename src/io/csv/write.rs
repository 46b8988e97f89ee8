//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};

use crate::report::UnitExport;

/// Write a DataFrame to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

/// Write per-unit district rows to a CSV file.
///
/// Columns, in order: `id`, `name`, `population`, `district`.
/// Unassigned units are written with district `-1`.
pub fn write_assignments_csv(rows: &[UnitExport], path: &Path) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Series::new("id".into(), rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()).into(),
        Series::new("name".into(), rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()).into(),
        Series::new("population".into(), rows.iter().map(|r| r.population).collect::<Vec<u64>>()).into(),
        Series::new("district".into(), rows.iter().map(|r| r.district).collect::<Vec<i64>>()).into(),
    ])?;

    write_csv(&mut df, path)
}
