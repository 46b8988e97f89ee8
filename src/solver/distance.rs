use geo::{Distance, Haversine, Point};
use ndarray::Array2;

use crate::{
    config::DistanceKind,
    error::{Error, Result},
    registry::{Unit, UnitRegistry},
};

/// Cost of assigning one unit to another unit's district, before normalization.
pub trait DistanceMetric {
    fn distance(&self, a: &Unit, b: &Unit) -> Result<f64>;

    /// Reject a unit this metric cannot measure.
    fn validate(&self, _unit: &Unit) -> Result<()> { Ok(()) }
}

impl<F> DistanceMetric for F
where
    F: Fn(&Unit, &Unit) -> f64,
{
    fn distance(&self, a: &Unit, b: &Unit) -> Result<f64> { Ok(self(a, b)) }
}

/// Every pair of distinct units is one unit apart; a unit is zero from itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uniform;

impl DistanceMetric for Uniform {
    fn distance(&self, a: &Unit, b: &Unit) -> Result<f64> {
        Ok(if a.id() == b.id() { 0.0 } else { 1.0 })
    }
}

/// Great-circle distance in meters between unit centroids.
#[derive(Clone, Copy, Debug, Default)]
pub struct HaversineCentroid;

impl HaversineCentroid {
    fn point(unit: &Unit) -> Result<Point> {
        unit.centroid()
            .map(|[lon, lat]| Point::new(lon, lat))
            .ok_or_else(|| Error::input(unit.id().as_str(), "haversine distance requires a centroid"))
    }
}

impl DistanceMetric for HaversineCentroid {
    fn distance(&self, a: &Unit, b: &Unit) -> Result<f64> {
        Ok(Haversine.distance(Self::point(a)?, Self::point(b)?))
    }

    fn validate(&self, unit: &Unit) -> Result<()> { Self::point(unit).map(|_| ()) }
}

/// Get the metric named by a config setting.
pub fn metric_for(kind: DistanceKind) -> Box<dyn DistanceMetric> {
    match kind {
        DistanceKind::Uniform => Box::new(Uniform),
        DistanceKind::Haversine => Box::new(HaversineCentroid),
    }
}

/// Pairwise distance matrix over the registry, scaled so every entry lies in [0, 1].
pub(crate) fn normalized_matrix<D: DistanceMetric + ?Sized>(registry: &UnitRegistry, metric: &D) -> Result<Array2<f64>> {
    let n = registry.len();
    let mut matrix = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            let d = metric.distance(&registry[i], &registry[j])?;
            if !(d.is_finite() && d >= 0.0) {
                return Err(Error::input(
                    registry[i].id().as_str(),
                    format!("distance to '{}' is {d}; distances must be finite and non-negative", registry[j].id()),
                ));
            }
            matrix[[i, j]] = d;
        }
    }

    let max = matrix.iter().copied().fold(0.0, f64::max);
    if max > 0.0 { matrix.mapv_inplace(|d| d / max) }

    Ok(matrix)
}
