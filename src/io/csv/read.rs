//! CSV reading operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, StringChunked}};

use crate::registry::UnitRecord;

/// Reads a CSV file with a header row into a DataFrame, keeping every column as text
/// so identifiers keep their leading zeros.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Get a required text column.
fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("[io::csv::read] CSV is missing required column '{name}'"))?
        .str()
        .with_context(|| format!("[io::csv::read] Column '{name}' is not text"))
}

/// Read unit records from a CSV table.
///
/// Required columns: `id`, `name`, `population`, `neighbors` (neighbor ids separated by `;`).
/// Optional columns `lon` and `lat` give the unit centroid.
pub fn read_units_csv(path: &Path) -> Result<Vec<UnitRecord>> {
    let df = read_csv(path)?;

    let ids = text_column(&df, "id")?;
    let names = text_column(&df, "name")?;
    let populations = text_column(&df, "population")?;
    let neighbors = text_column(&df, "neighbors")?;
    let (lons, lats) = match (df.column("lon"), df.column("lat")) {
        (Ok(_), Ok(_)) => (Some(text_column(&df, "lon")?), Some(text_column(&df, "lat")?)),
        (Err(_), Err(_)) => (None, None),
        _ => return Err(anyhow!("[io::csv::read] Columns 'lon' and 'lat' must appear together")),
    };

    (0..df.height())
        .map(|row| {
            let id = ids.get(row).map(str::trim).unwrap_or_default();
            ensure!(!id.is_empty(), "[io::csv::read] Row {} has no id", row + 1);

            let population = populations.get(row).map(str::trim).unwrap_or_default();
            let population = population.parse::<i64>()
                .with_context(|| format!("[io::csv::read] Unit '{id}' has invalid population '{population}'"))?;

            let neighbor_ids = neighbors.get(row).unwrap_or_default()
                .split(';')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();

            let centroid = match (lons.and_then(|c| c.get(row)), lats.and_then(|c| c.get(row))) {
                (Some(lon), Some(lat)) if !lon.trim().is_empty() && !lat.trim().is_empty() => {
                    let parse = |v: &str| v.trim().parse::<f64>()
                        .with_context(|| format!("[io::csv::read] Unit '{id}' has invalid coordinate '{v}'"));
                    Some([parse(lon)?, parse(lat)?])
                }
                _ => None,
            };

            Ok(UnitRecord {
                id: id.to_string(),
                name: names.get(row).unwrap_or_default().trim().to_string(),
                population,
                neighbor_ids,
                centroid,
            })
        })
        .collect()
}
