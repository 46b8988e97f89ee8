use crate::registry::{UnitId, UnitRegistry};

/// District label exported for units without a district.
pub const UNASSIGNED: i64 = -1;

/// An immutable mapping from unit (by registry position) to district number in `1..=K`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistrictAssignment {
    num_districts: u32,
    labels: Vec<Option<u32>>,
}

impl DistrictAssignment {
    /// Create an assignment where every unit is unassigned.
    pub fn unassigned(num_units: usize, num_districts: u32) -> Self {
        Self { num_districts, labels: vec![None; num_units] }
    }

    /// Create an assignment from per-unit labels.
    pub fn from_labels(num_districts: u32, labels: Vec<Option<u32>>) -> Self {
        assert!(
            labels.iter().flatten().all(|&d| (1..=num_districts).contains(&d)),
            "district labels must be in range [1, {num_districts}]"
        );
        Self { num_districts, labels }
    }

    /// Get the number of districts (excluding the unassigned bucket).
    #[inline] pub fn num_districts(&self) -> u32 { self.num_districts }

    /// Get the number of units covered by this assignment.
    #[inline] pub fn len(&self) -> usize { self.labels.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    /// Get the district of the unit at a registry position.
    #[inline] pub fn district(&self, unit: usize) -> Option<u32> { self.labels[unit] }

    /// Get the per-unit labels in registry order.
    #[inline] pub fn labels(&self) -> &[Option<u32>] { &self.labels }

    /// Look up the district of a unit by identifier.
    pub fn district_of(&self, registry: &UnitRegistry, id: &UnitId) -> Option<u32> {
        registry.index_of(id).and_then(|i| self.labels.get(i).copied().flatten())
    }

    /// Whether every unit has a district.
    pub fn is_total(&self) -> bool { self.labels.iter().all(Option::is_some) }

    /// Registry positions of the units in each district; entry `d - 1` holds district `d`.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.num_districts as usize];
        for (unit, label) in self.labels.iter().enumerate() {
            if let Some(d) = label { members[*d as usize - 1].push(unit) }
        }
        members
    }

    /// Registry positions of units without a district.
    pub fn unassigned_units(&self) -> Vec<usize> {
        self.labels.iter().enumerate()
            .filter_map(|(unit, label)| label.is_none().then_some(unit))
            .collect()
    }

    /// Sum of populations per district; entry `d - 1` holds district `d`.
    pub fn district_populations(&self, populations: &[u64]) -> Vec<u64> {
        assert!(populations.len() == self.len(), "populations.len() must equal number of units");
        let mut totals = vec![0u64; self.num_districts as usize];
        for (label, &population) in self.labels.iter().zip(populations) {
            if let Some(d) = label { totals[*d as usize - 1] += population }
        }
        totals
    }

    /// Count units whose label differs from another assignment of the same units.
    pub fn changed_from(&self, other: &DistrictAssignment) -> usize {
        assert!(other.len() == self.len(), "assignments must cover the same units");
        self.labels.iter().zip(&other.labels).filter(|(a, b)| a != b).count()
    }

    /// District labels as exported integers, with `UNASSIGNED` for missing labels.
    pub fn export_labels(&self) -> Vec<i64> {
        self.labels.iter().map(|label| label.map_or(UNASSIGNED, i64::from)).collect()
    }
}

/// A contiguous assignment together with the center unit of every district.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContiguousAssignment {
    pub(crate) assignment: DistrictAssignment,
    pub(crate) centers: Vec<usize>,
}

impl ContiguousAssignment {
    /// Get the district assignment.
    #[inline] pub fn assignment(&self) -> &DistrictAssignment { &self.assignment }

    /// Registry positions of the district centers; entry `d - 1` is the center of district `d`.
    #[inline] pub fn centers(&self) -> &[usize] { &self.centers }

    pub fn into_assignment(self) -> DistrictAssignment { self.assignment }
}
