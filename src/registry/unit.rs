use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Stable key for a unit, e.g. a county GEOID.
/// Keeps the original text (with leading zeros) and is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(Arc<str>);

impl UnitId {
    pub fn new(id: impl AsRef<str>) -> Self { Self(Arc::from(id.as_ref())) }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self { Self(Arc::from(id)) }
}

/// A unit row as supplied by the data-loading collaborator, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: String,
    pub name: String,
    pub population: i64,
    #[serde(default)]
    pub neighbor_ids: Vec<String>,
    /// Centroid as `[longitude, latitude]` in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 2]>,
}

impl UnitRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, population: i64, neighbor_ids: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            population,
            neighbor_ids: neighbor_ids.iter().map(|&n| n.to_string()).collect(),
            centroid: None,
        }
    }

    pub fn with_centroid(mut self, lon: f64, lat: f64) -> Self {
        self.centroid = Some([lon, lat]);
        self
    }
}

/// A validated geographic unit (county or independent city).
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    id: UnitId,
    name: String,
    population: u64,
    neighbors: Vec<UnitId>,
    centroid: Option<[f64; 2]>,
}

impl Unit {
    pub(super) fn new(id: UnitId, name: String, population: u64, neighbors: Vec<UnitId>, centroid: Option<[f64; 2]>) -> Self {
        Self { id, name, population, neighbors, centroid }
    }

    #[inline] pub fn id(&self) -> &UnitId { &self.id }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn population(&self) -> u64 { self.population }

    /// Neighbor identifiers in input order. May reference units outside the registry.
    #[inline] pub fn neighbors(&self) -> &[UnitId] { &self.neighbors }

    /// Centroid as `[longitude, latitude]`, if known.
    #[inline] pub fn centroid(&self) -> Option<[f64; 2]> { self.centroid }
}
