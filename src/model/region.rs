//! Reusable region descriptions.

use super::curve::Curve;
use super::order::Order;
use super::producer::{Producer, User};

/// Key of the demand user every region order carries.
pub const DEMAND_KEY: &str = "local_demand";

/// A market region: its producer park and its demand curve.
///
/// A region is a factory for [`Order`]s. Each call to [`Region::order`]
/// mints a fresh order with cleared load curves, so the same region can
/// be calculated several times (the convergence runner needs two passes
/// over the local region and one over the foreign one).
#[derive(Debug, Clone)]
pub struct Region {
    code: String,
    points: usize,
    producers: Vec<Producer>,
    demand: Curve,
}

impl Region {
    /// Creates a region with no producers and zero demand.
    pub fn new(code: impl Into<String>, points: usize) -> Self {
        Self {
            code: code.into(),
            points,
            producers: Vec::new(),
            demand: Curve::zeroes(points),
        }
    }

    /// Region code (e.g. `"nl"`, `"de"`).
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of points in the horizon.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Adds a producer template to the park.
    pub fn add_producer(&mut self, producer: Producer) {
        self.producers.push(producer);
    }

    /// Replaces the region's demand curve.
    pub fn set_demand(&mut self, demand: Curve) {
        self.demand = demand;
    }

    /// The region's demand curve.
    pub fn demand_curve(&self) -> &Curve {
        &self.demand
    }

    /// Builds a fresh order: cleared copies of every producer plus a
    /// single demand user.
    pub fn order(&self) -> Order {
        let mut order = Order::new(self.points);
        for producer in &self.producers {
            order.add_producer(producer.cleared());
        }
        order.add_user(User::new(DEMAND_KEY, self.demand.clone()));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CostModel;

    #[test]
    fn order_carries_park_and_demand() {
        let mut region = Region::new("nl", 2);
        region.add_producer(Producer::dispatchable(
            "gas",
            CostModel::constant(20.0),
            1.0,
            1.0,
            1.0,
            2,
        ));
        region.set_demand(Curve::flat(2, 0.5));

        let order = region.order();
        assert_eq!(order.producers().len(), 1);
        assert_eq!(order.demand_at(0), 0.5);
    }

    #[test]
    fn each_order_starts_with_cleared_loads() {
        let mut template = Producer::dispatchable("gas", CostModel::constant(20.0), 1.0, 1.0, 1.0, 1);
        template.assign(0, 0.7);

        let mut region = Region::new("nl", 1);
        region.add_producer(template);

        let order = region.order();
        assert_eq!(order.producers()[0].load_at(0), 0.0);
    }
}
