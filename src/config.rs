use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Cost metric used by the contiguity objective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    /// Every pair of distinct units is equally far apart.
    #[default]
    Uniform,
    /// Great-circle distance between unit centroids.
    Haversine,
}

/// Settings for a districting run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of districts K.
    pub num_districts: usize,
    /// Allowed population deviation as a fraction of the ideal district size (e.g. 0.30).
    pub deviation: f64,
    /// Enforce the lower/upper population bounds as hard constraints in the contiguity model.
    pub enforce_bounds: bool,
    /// Time budget per solve in seconds; `None` lets the engine run until optimality.
    pub time_limit_secs: Option<f64>,
    pub distance: DistanceKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_districts: 1,
            deviation: 0.30,
            enforce_bounds: true,
            time_limit_secs: Some(300.0),
            distance: DistanceKind::Uniform,
        }
    }
}

impl PipelineConfig {
    pub fn new(num_districts: usize) -> Self {
        Self { num_districts, ..Self::default() }
    }

    /// Read a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config::from_json_file] Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("[config::from_json_file] Failed to parse config from {:?}", path))
    }

    /// Check that the settings describe a solvable problem shape.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_districts == 0 {
            return Err(Error::InvalidConfig("number of districts must be at least 1".into()));
        }
        if !(0.0..2.0).contains(&self.deviation) {
            return Err(Error::InvalidConfig(format!("deviation must be in [0, 2), got {}", self.deviation)));
        }
        if let Some(secs) = self.time_limit_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(Error::InvalidConfig(format!("time limit must be a positive number of seconds, got {secs}")));
            }
        }
        Ok(())
    }

    /// Time budget for each solver call.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }
}

/// Population target and soft bounds for each district.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PopulationBounds {
    pub total: u64,
    pub target: u64,
    pub lower: u64,
    pub upper: u64,
}

impl PopulationBounds {
    // Absorbs float noise such as 1.15 * 200 = 229.99999999999997.
    const ROUNDING_SLACK: f64 = 1e-9;

    pub fn new(total: u64, num_districts: usize, deviation: f64) -> Self {
        assert!(num_districts > 0, "num_districts must be at least 1");
        let ideal = total as f64 / num_districts as f64;

        Self {
            total,
            target: total / num_districts as u64,
            lower: ((1.0 - deviation / 2.0) * ideal - Self::ROUNDING_SLACK).ceil().max(0.0) as u64,
            upper: ((1.0 + deviation / 2.0) * ideal + Self::ROUNDING_SLACK).floor() as u64,
        }
    }

    /// Whether a district population lies within `[lower, upper]`.
    #[inline] pub fn contains(&self, population: u64) -> bool { (self.lower..=self.upper).contains(&population) }
}
