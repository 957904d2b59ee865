//! Fixed-length time series over the planning horizon.

/// A fixed-length sequence of per-point values.
///
/// Every curve in one calculation shares the same index space: integer
/// points in `[0, len)`, e.g. hourly steps over a year. Curves are mutable
/// by index and owned by whichever entity tracks the quantity (assigned
/// load, price, capacity, demand).
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    values: Vec<f64>,
}

impl Curve {
    /// Creates a curve of `points` zeroes.
    pub fn zeroes(points: usize) -> Self {
        Self::flat(points, 0.0)
    }

    /// Creates a curve holding `value` at every point.
    pub fn flat(points: usize, value: f64) -> Self {
        Self {
            values: vec![value; points],
        }
    }

    /// Creates a curve from explicit per-point values.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of points in the horizon.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `point`.
    ///
    /// # Panics
    ///
    /// Panics if `point` is out of range.
    pub fn get(&self, point: usize) -> f64 {
        self.values[point]
    }

    /// Overwrites the value at `point`.
    ///
    /// # Panics
    ///
    /// Panics if `point` is out of range.
    pub fn set(&mut self, point: usize, value: f64) {
        self.values[point] = value;
    }

    /// Adds `value` to the current value at `point`.
    pub fn add(&mut self, point: usize, value: f64) {
        self.values[point] += value;
    }

    /// Iterates over the per-point values.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// A per-point quantity that is either flat or varies over time.
///
/// Used where the model accepts "a constant broadcast to a full-length
/// curve, or a curve directly": interconnect capacity and constant
/// marginal costs.
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    /// The same value at every point.
    Flat(f64),
    /// A distinct value per point.
    Varying(Curve),
}

impl Series {
    /// Value at `point`.
    pub fn get(&self, point: usize) -> f64 {
        match self {
            Series::Flat(value) => *value,
            Series::Varying(curve) => curve.get(point),
        }
    }

    /// Materializes the series as a full-length curve.
    pub fn to_curve(&self, points: usize) -> Curve {
        match self {
            Series::Flat(value) => Curve::flat(points, *value),
            Series::Varying(curve) => curve.clone(),
        }
    }
}

impl From<f64> for Series {
    fn from(value: f64) -> Self {
        Series::Flat(value)
    }
}

impl From<Curve> for Series {
    fn from(curve: Curve) -> Self {
        Series::Varying(curve)
    }
}
