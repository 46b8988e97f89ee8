use std::ops::Index;

use ahash::{AHashMap, AHashSet};

use crate::{
    error::{Error, Result},
    registry::{Unit, UnitId, UnitRecord},
};

/// In-memory table of units, in input order.
#[derive(Clone, Debug, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
}

impl UnitRegistry {
    /// Validate raw records and build the registry.
    ///
    /// Rejects negative populations, self-references and duplicate identifiers,
    /// naming the offending unit. Neighbor references to unknown units are kept
    /// here and dropped later by the graph builder.
    pub fn from_records(records: impl IntoIterator<Item = UnitRecord>) -> Result<Self> {
        let mut registry = Self::default();

        for record in records {
            let id = UnitId::from(record.id);
            if id.as_str().is_empty() {
                return Err(Error::input(&record.name, "empty identifier"));
            }
            if registry.index.contains_key(&id) {
                return Err(Error::input(id.as_str(), "duplicate identifier"));
            }
            let population = u64::try_from(record.population)
                .map_err(|_| Error::input(id.as_str(), format!("negative population {}", record.population)))?;

            let mut seen = AHashSet::with_capacity(record.neighbor_ids.len());
            let mut neighbors = Vec::with_capacity(record.neighbor_ids.len());
            for neighbor in record.neighbor_ids {
                if neighbor == id.as_str() {
                    return Err(Error::input(id.as_str(), "unit lists itself as a neighbor"));
                }
                if seen.insert(neighbor.clone()) { neighbors.push(UnitId::from(neighbor)) }
            }

            if let Some([lon, lat]) = record.centroid {
                if !(lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)) {
                    return Err(Error::input(id.as_str(), format!("centroid ({lon}, {lat}) is not a valid longitude/latitude")));
                }
            }

            registry.index.insert(id.clone(), registry.units.len());
            registry.units.push(Unit::new(id, record.name, population, neighbors, record.centroid));
        }

        Ok(registry)
    }

    /// Get the number of units.
    #[inline] pub fn len(&self) -> usize { self.units.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.units.is_empty() }

    /// Get the units in registry order.
    #[inline] pub fn units(&self) -> &[Unit] { &self.units }

    /// Get the registry position of a unit identifier.
    #[inline] pub fn index_of(&self, id: &UnitId) -> Option<usize> { self.index.get(id).copied() }

    #[inline] pub fn contains(&self, id: &UnitId) -> bool { self.index.contains_key(id) }

    /// Look up a unit by identifier.
    pub fn get(&self, id: &UnitId) -> Option<&Unit> {
        self.index_of(id).map(|i| &self.units[i])
    }

    /// Populations in registry order.
    pub fn populations(&self) -> Vec<u64> {
        self.units.iter().map(Unit::population).collect()
    }

    /// Total population of all units.
    pub fn total_population(&self) -> u64 {
        self.units.iter().map(Unit::population).sum()
    }

    /// Count neighbor references that point outside the registry.
    pub fn dangling_neighbor_count(&self) -> usize {
        self.units.iter()
            .flat_map(|unit| unit.neighbors())
            .filter(|&neighbor| !self.contains(neighbor))
            .count()
    }
}

impl Index<usize> for UnitRegistry {
    type Output = Unit;

    fn index(&self, index: usize) -> &Unit { &self.units[index] }
}
