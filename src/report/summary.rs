use serde::Serialize;

use crate::{
    assignment::{DistrictAssignment, UNASSIGNED},
    registry::UnitRegistry,
};

/// Flat per-unit export row; columns in this order: id, name, population, district.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitExport {
    pub id: String,
    pub name: String,
    pub population: u64,
    /// District number, or `-1` when the unit is unassigned.
    pub district: i64,
}

/// Population and membership of one district.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistrictSummary {
    #[serde(rename = "district_number")]
    pub district: u32,
    pub total_population: u64,
    pub member_names: Vec<String>,
}

impl DistrictSummary {
    #[inline] pub fn num_members(&self) -> usize { self.member_names.len() }

    /// Signed difference from a target population.
    #[inline] pub fn deviation(&self, target: u64) -> i64 { self.total_population as i64 - target as i64 }
}

/// Units that ended up without a district.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UnassignedBucket {
    pub total_population: u64,
    pub member_names: Vec<String>,
}

impl UnassignedBucket {
    #[inline] pub fn is_empty(&self) -> bool { self.member_names.is_empty() }
}

/// Per-district view of an assignment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub districts: Vec<DistrictSummary>,
    pub unassigned: UnassignedBucket,
}

impl Summary {
    /// Build the per-district summaries of an assignment.
    /// Members are listed in registry order; unassigned units go to their own bucket.
    pub fn new(registry: &UnitRegistry, assignment: &DistrictAssignment) -> Self {
        assert!(assignment.len() == registry.len(), "assignment must cover every unit in the registry");

        let mut districts = (1..=assignment.num_districts())
            .map(|district| DistrictSummary { district, total_population: 0, member_names: Vec::new() })
            .collect::<Vec<_>>();
        let mut unassigned = UnassignedBucket::default();

        for (unit, label) in registry.units().iter().zip(assignment.labels()) {
            let (total, names) = match label {
                Some(d) => {
                    let summary = &mut districts[*d as usize - 1];
                    (&mut summary.total_population, &mut summary.member_names)
                }
                None => (&mut unassigned.total_population, &mut unassigned.member_names),
            };
            *total += unit.population();
            names.push(unit.name().to_string());
        }

        Self { districts, unassigned }
    }

    /// Total population over districts and the unassigned bucket.
    pub fn total_population(&self) -> u64 {
        self.districts.iter().map(|d| d.total_population).sum::<u64>() + self.unassigned.total_population
    }

    /// Sum of absolute district deviations from a target population.
    pub fn total_deviation(&self, target: u64) -> u64 {
        self.districts.iter().map(|d| d.total_population.abs_diff(target)).sum()
    }
}

/// Flat export rows for every unit, in registry order.
pub fn unit_exports(registry: &UnitRegistry, assignment: &DistrictAssignment) -> Vec<UnitExport> {
    assert!(assignment.len() == registry.len(), "assignment must cover every unit in the registry");

    registry.units().iter().zip(assignment.labels())
        .map(|(unit, label)| UnitExport {
            id: unit.id().to_string(),
            name: unit.name().to_string(),
            population: unit.population(),
            district: label.map_or(UNASSIGNED, i64::from),
        })
        .collect()
}
