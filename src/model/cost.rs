//! Marginal cost models for producers.

use super::curve::Series;

/// How a producer's marginal cost is determined.
///
/// Either the cost is independent of the producer's own load (constant,
/// possibly varying by point), or it rises with the load already
/// assigned to the producer (a non-linear supply curve).
#[derive(Debug, Clone, PartialEq)]
pub enum CostModel {
    /// Cost independent of assigned load. Flat or fuel-indexed per point;
    /// interconnect imports use the counterpart market's price curve here.
    Constant(Series),
    /// Cost rising linearly with the producer's own assigned load, from
    /// `base * (1 - spread / 2)` at zero load to `base * (1 + spread / 2)`
    /// at full capacity.
    Function {
        /// Marginal cost at the midpoint of the supply curve.
        base: f64,
        /// Fractional width of the cost band around `base`.
        spread: f64,
    },
}

impl CostModel {
    /// A flat constant cost.
    pub fn constant(cost: f64) -> Self {
        CostModel::Constant(Series::Flat(cost))
    }

    /// A per-point constant cost (e.g. fuel-indexed, or a foreign price
    /// curve for an interconnect import).
    pub fn indexed(series: impl Into<Series>) -> Self {
        CostModel::Constant(series.into())
    }

    /// A load-dependent cost function.
    pub fn function(base: f64, spread: f64) -> Self {
        CostModel::Function { base, spread }
    }

    /// Whether this is the load-dependent variant.
    pub fn is_function(&self) -> bool {
        matches!(self, CostModel::Function { .. })
    }

    /// Marginal cost at `load`, given the producer's total available
    /// `capacity`. For constant-cost models the load is irrelevant and the
    /// per-point value at `point` is returned.
    pub fn at_load(&self, load: f64, capacity: f64, point: usize) -> f64 {
        match self {
            CostModel::Constant(series) => series.get(point),
            CostModel::Function { base, spread } => {
                let lower = base * (1.0 - spread / 2.0);
                let band = base * spread;
                if capacity <= 0.0 {
                    lower
                } else {
                    lower + (load / capacity) * band
                }
            }
        }
    }
}
