//! Export analysis between two calculated markets.

use crate::model::{Curve, Dispatch, Series};

/// Given two calculated markets and an interconnect capacity, determines
/// per point how much energy the local market can competitively export.
///
/// Export happens only where the local price undercuts the foreign one,
/// and is capped three ways: by the spare capacity of local producers
/// still cheaper than the foreign price, by the foreign load currently
/// served at a cost above the local price (the energy the foreign market
/// would rather import), and by the interconnect capacity. The
/// foreign-demand cap is deliberate; a simplified variant without it is
/// not supported.
pub struct ExportAnalyzer<'a> {
    local: &'a Dispatch,
    foreign: &'a Dispatch,
    capacity: Curve,
}

impl<'a> ExportAnalyzer<'a> {
    /// Creates an analyzer over a finalized local and foreign dispatch.
    /// `capacity` may be a flat number or a full-length curve.
    pub fn new(local: &'a Dispatch, foreign: &'a Dispatch, capacity: impl Into<Series>) -> Self {
        Self {
            local,
            foreign,
            capacity: capacity.into().to_curve(local.points()),
        }
    }

    /// Runs the analyzer, returning the exported quantity per point.
    pub fn load_curve(&self) -> Curve {
        let mut curve = Curve::zeroes(self.local.points());

        for point in 0..self.local.points() {
            if self.cheaper_locally(point) {
                let export = self
                    .available_capacity(point)
                    .min(self.foreign_demand(point))
                    .min(self.capacity.get(point));
                curve.set(point, export);
            }
        }

        curve
    }

    fn cheaper_locally(&self, point: usize) -> bool {
        self.local.price_at(point) < self.foreign.price_at(point)
    }

    /// Spare capacity of local producers that undercut the foreign price.
    fn available_capacity(&self, point: usize) -> f64 {
        let price = self.foreign.price_at(point);

        self.local
            .dispatchables()
            .filter(|producer| {
                producer.sortable_cost(point) < price
                    && producer.max_load_at(point) > producer.load_at(point)
            })
            .map(|producer| producer.max_load_at(point) - producer.load_at(point))
            .sum()
    }

    /// Foreign load currently served at a cost above the local price.
    fn foreign_demand(&self, point: usize) -> f64 {
        let price = self.local.price_at(point);

        self.foreign
            .dispatchables()
            .filter(|producer| {
                producer.sortable_cost(point) > price && producer.load_at(point) > 0.0
            })
            .map(|producer| producer.load_at(point))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchEngine;
    use crate::model::{CostModel, Dispatch, Order, Producer, User};

    fn producer(key: &str, cost: f64, units: f64, points: usize) -> Producer {
        Producer::dispatchable(key, CostModel::constant(cost), 1.0, units, 1.0, points)
    }

    fn calculated(producers: Vec<Producer>, demand: f64) -> Dispatch {
        let mut order = Order::new(1);
        for p in producers {
            order.add_producer(p);
        }
        order.add_user(User::new("user", Curve::flat(1, demand)));
        DispatchEngine::new().calculate(order).unwrap()
    }

    fn local(demand: f64) -> Dispatch {
        calculated(
            vec![
                producer("prod1", 10.0, 1.0, 1),
                producer("prod2", 20.0, 1.0, 1),
                producer("prod3", 30.0, 3.0, 1),
            ],
            demand,
        )
    }

    fn foreign_flat(costs: [f64; 5], demand: f64) -> Dispatch {
        calculated(
            costs
                .iter()
                .enumerate()
                .map(|(i, &cost)| producer(&format!("other_{}", i + 1), cost, 1.0, 1))
                .collect(),
            demand,
        )
    }

    fn export_at_zero(local: &Dispatch, foreign: &Dispatch, capacity: f64) -> f64 {
        ExportAnalyzer::new(local, foreign, capacity)
            .load_curve()
            .get(0)
    }

    #[test]
    fn no_export_when_the_foreign_market_is_cheaper() {
        let local = local(2.0);
        let foreign = foreign_flat([10.0; 5], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 0.0);
    }

    #[test]
    fn export_limited_by_local_spare_capacity() {
        // Local demand 2.0 leaves 3.0 spare in prod3; foreign price 40.
        let local = local(2.0);
        let foreign = foreign_flat([40.0; 5], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 3.0);
    }

    #[test]
    fn partially_loaded_producers_contribute_their_headroom() {
        // Demand 1.5: prod2 keeps 0.5 spare, prod3 keeps 3.0.
        let local = local(1.5);
        let foreign = foreign_flat([40.0; 5], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 3.5);
    }

    #[test]
    fn producers_above_the_foreign_price_are_excluded() {
        let local = calculated(
            vec![
                producer("prod1", 10.0, 1.0, 1),
                producer("prod2", 20.0, 1.0, 1),
                producer("prod3", 50.0, 3.0, 1),
            ],
            0.5,
        );
        let foreign = foreign_flat([40.0; 5], 4.0);
        // 0.5 spare in prod1, 1.0 in prod2, nothing from prod3.
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 1.5);
    }

    #[test]
    fn export_limited_by_interconnect_capacity() {
        let local = local(2.0);
        let foreign = foreign_flat([40.0; 5], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 2.0), 2.0);
    }

    #[test]
    fn export_limited_by_expensive_foreign_load() {
        // Only 1.0 of foreign load is priced above the local price.
        let local = local(2.0);
        let foreign = foreign_flat([10.0, 10.0, 10.0, 40.0, 40.0], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 1.0);
    }

    #[test]
    fn no_export_without_local_spare_capacity() {
        let local = local(5.0);
        let foreign = foreign_flat([40.0; 5], 4.0);
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 0.0);
    }

    #[test]
    fn foreign_step_function_load_counts_at_its_loaded_cost() {
        // Foreign park: two cheap plants, a four-unit cost-function plant
        // (27.0 to 33.0 across its capacity) and two expensive ones.
        // Foreign demand 7.0 loads the function plant fully, pushing its
        // cost above the local price.
        let foreign = calculated(
            vec![
                producer("other_1", 10.0, 1.0, 1),
                producer("other_2", 10.0, 1.0, 1),
                Producer::dispatchable(
                    "other_3",
                    CostModel::function(30.0, 0.2),
                    1.0,
                    4.0,
                    1.0,
                    1,
                ),
                producer("other_4", 40.0, 1.0, 1),
                producer("other_5", 40.0, 1.0, 1),
            ],
            7.0,
        );
        let local = local(2.0);
        // Local spare capacity (3.0 in prod3) is the binding limit.
        assert_eq!(export_at_zero(&local, &foreign, 10.0), 3.0);
    }

    #[test]
    fn capacity_accepts_a_curve() {
        let local = local(2.0);
        let foreign = foreign_flat([40.0; 5], 4.0);
        let capacity = Curve::from_values(vec![1.5]);
        let export = ExportAnalyzer::new(&local, &foreign, capacity).load_curve();
        assert_eq!(export.get(0), 1.5);
    }
}
