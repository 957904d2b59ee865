//! Shared test fixtures for integration tests.

use merit_sim::model::{CostModel, Curve, Producer, Region};

/// Horizon used by the fixture regions.
pub const POINTS: usize = 4;

/// A cheap three-tier market: constant-cost plants at 10, 20 and 30 with
/// 3.0 capacity each, carrying a flat demand of 2.0.
pub fn cheap_region(code: &str) -> Region {
    let mut region = Region::new(code, POINTS);
    for (i, cost) in [10.0, 20.0, 30.0].into_iter().enumerate() {
        region.add_producer(Producer::dispatchable(
            format!("{code}_plant_{i}"),
            CostModel::constant(cost),
            1.0,
            3.0,
            1.0,
            POINTS,
        ));
    }
    region.set_demand(Curve::flat(POINTS, 2.0));
    region
}

/// An expensive two-tier market: constant-cost plants at 40 and 50 with
/// 3.0 capacity each, carrying a flat demand of 4.0.
pub fn pricey_region(code: &str) -> Region {
    let mut region = Region::new(code, POINTS);
    for (i, cost) in [40.0, 50.0].into_iter().enumerate() {
        region.add_producer(Producer::dispatchable(
            format!("{code}_plant_{i}"),
            CostModel::constant(cost),
            1.0,
            3.0,
            1.0,
            POINTS,
        ));
    }
    region.set_demand(Curve::flat(POINTS, 4.0));
    region
}

/// A market dominated by a cost-function gas park: 10 units of 10.0 with
/// a linear cost ramp from 16 to 24 (base 20, spread 0.4).
pub fn gas_region(code: &str, demand: f64) -> Region {
    let mut region = Region::new(code, POINTS);
    region.add_producer(Producer::dispatchable(
        format!("{code}_gas"),
        CostModel::function(20.0, 0.4),
        10.0,
        10.0,
        1.0,
        POINTS,
    ));
    region.set_demand(Curve::flat(POINTS, demand));
    region
}
