//! Producers, their capacity models, and demand users.

use super::cost::CostModel;
use super::curve::{Curve, Series};

/// How a producer participates in the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Output is fixed by a production profile and not subject to
    /// cost-based allocation; loaded unconditionally to its maximum.
    AlwaysOn,
    /// Flexible output, assigned by the cost-ranked greedy loop.
    Dispatchable,
}

/// Maximum deliverable load of a producer.
#[derive(Debug, Clone, PartialEq)]
pub enum Capacity {
    /// A plant park: identical units derated by availability. The per-unit
    /// capacity is the quantum ("chunk") of incremental assignment.
    Units {
        /// Output capacity of one unit.
        per_unit: f64,
        /// Number of units. Fractional unit counts are permitted.
        units: f64,
        /// Fraction of capacity actually deliverable, in `[0, 1]`.
        availability: f64,
    },
    /// A per-point limit curve: always-on production profiles and
    /// time-varying interconnect limits. The whole point value is one
    /// chunk.
    Profile(Curve),
}

impl Capacity {
    /// Maximum deliverable load at `point`.
    pub fn max_at(&self, point: usize) -> f64 {
        match self {
            Capacity::Units {
                per_unit,
                units,
                availability,
            } => per_unit * units * availability,
            Capacity::Profile(curve) => curve.get(point),
        }
    }

    /// The assignment quantum at `point`.
    pub fn chunk_at(&self, point: usize) -> f64 {
        match self {
            Capacity::Units { per_unit, .. } => *per_unit,
            Capacity::Profile(curve) => curve.get(point),
        }
    }

    /// Whole-unit count, used to bound the chunk-assignment loop.
    pub fn whole_units(&self) -> usize {
        match self {
            Capacity::Units { units, .. } => units.ceil() as usize,
            Capacity::Profile(_) => 1,
        }
    }
}

/// A generation source with a cost model, a capacity model, and the load
/// curve the dispatch calculation fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Producer {
    key: String,
    role: Role,
    cost: CostModel,
    capacity: Capacity,
    load: Curve,
}

impl Producer {
    /// Creates a dispatchable producer with a plant-park capacity.
    pub fn dispatchable(
        key: impl Into<String>,
        cost: CostModel,
        per_unit: f64,
        units: f64,
        availability: f64,
        points: usize,
    ) -> Self {
        Self {
            key: key.into(),
            role: Role::Dispatchable,
            cost,
            capacity: Capacity::Units {
                per_unit,
                units,
                availability,
            },
            load: Curve::zeroes(points),
        }
    }

    /// Creates an always-on producer following a fixed production profile.
    pub fn always_on(key: impl Into<String>, production: Curve) -> Self {
        let points = production.len();
        Self {
            key: key.into(),
            role: Role::AlwaysOn,
            cost: CostModel::constant(0.0),
            capacity: Capacity::Profile(production),
            load: Curve::zeroes(points),
        }
    }

    /// Creates an interconnect import pseudo-producer: a dispatchable
    /// source priced at the counterpart market's price curve, limited by
    /// the negotiated link capacity (flat or time-varying).
    pub fn interconnect(
        key: impl Into<String>,
        price: Curve,
        capacity: impl Into<Series>,
        points: usize,
    ) -> Self {
        let capacity = match capacity.into() {
            Series::Flat(limit) => Capacity::Units {
                per_unit: limit,
                units: 1.0,
                availability: 1.0,
            },
            Series::Varying(curve) => Capacity::Profile(curve),
        };

        Self {
            key: key.into(),
            role: Role::Dispatchable,
            cost: CostModel::indexed(price),
            capacity,
            load: Curve::zeroes(points),
        }
    }

    /// Unique key of the producer.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Allocation role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this producer is subject to the cost-ranked loop.
    pub fn is_dispatchable(&self) -> bool {
        self.role == Role::Dispatchable
    }

    /// The producer's cost model.
    pub fn cost(&self) -> &CostModel {
        &self.cost
    }

    /// Maximum deliverable load at `point`.
    pub fn max_load_at(&self, point: usize) -> f64 {
        self.capacity.max_at(point)
    }

    /// Capacity of one unit at `point` (the assignment quantum).
    pub fn chunk_at(&self, point: usize) -> f64 {
        self.capacity.chunk_at(point)
    }

    /// Whole-unit count of the capacity model.
    pub fn whole_units(&self) -> usize {
        self.capacity.whole_units()
    }

    /// The assigned-load curve.
    pub fn load_curve(&self) -> &Curve {
        &self.load
    }

    /// Assigned load at `point`.
    pub fn load_at(&self, point: usize) -> f64 {
        self.load.get(point)
    }

    /// Cost used to rank this producer in the merit order at `point`.
    ///
    /// Constant-cost producers return their per-point cost; cost-function
    /// producers return the marginal cost at their currently assigned
    /// load, which keeps ranking, export analysis, and pricing consistent.
    pub fn sortable_cost(&self, point: usize) -> f64 {
        self.cost_at_load(self.load.get(point), point)
    }

    /// Marginal cost at the given `load`.
    pub fn cost_at_load(&self, load: f64, point: usize) -> f64 {
        self.cost.at_load(load, self.max_load_at(point), point)
    }

    /// Whether this producer would set the market price when it receives
    /// the final partial assignment at `point`. Constant-cost producers
    /// always do; cost-function producers only while spare capacity
    /// remains, so a producer filled exactly to its maximum passes
    /// price-setting on to the next one in the merit order.
    pub fn price_setting(&self, point: usize) -> bool {
        match &self.cost {
            CostModel::Constant(_) => true,
            CostModel::Function { .. } => self.load.get(point) < self.max_load_at(point),
        }
    }

    /// A copy of this producer with an empty load curve, for a fresh
    /// calculation.
    pub fn cleared(&self) -> Self {
        let mut copy = self.clone();
        copy.load = Curve::zeroes(self.load.len());
        copy
    }

    pub(crate) fn assign(&mut self, point: usize, amount: f64) {
        self.load.add(point, amount);
    }

    pub(crate) fn set_load(&mut self, point: usize, value: f64) {
        self.load.set(point, value);
    }
}

/// A demand participant: a named load curve the producers must cover.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    key: String,
    demand: Curve,
}

impl User {
    /// Creates a user with the given demand curve.
    pub fn new(key: impl Into<String>, demand: Curve) -> Self {
        Self {
            key: key.into(),
            demand,
        }
    }

    /// Unique key of the user.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The demand curve.
    pub fn demand_curve(&self) -> &Curve {
        &self.demand
    }

    /// Demand at `point`.
    pub fn load_at(&self, point: usize) -> f64 {
        self.demand.get(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_park_max_load_derated_by_availability() {
        let producer =
            Producer::dispatchable("coal", CostModel::constant(23.0), 740.0, 3.0, 0.9, 8);
        assert!((producer.max_load_at(0) - 1998.0).abs() < 1e-9);
        assert_eq!(producer.chunk_at(0), 740.0);
        assert_eq!(producer.whole_units(), 3);
    }

    #[test]
    fn always_on_follows_profile() {
        let producer = Producer::always_on("wind", Curve::from_values(vec![1.0, 0.5, 0.0]));
        assert_eq!(producer.role(), Role::AlwaysOn);
        assert_eq!(producer.max_load_at(1), 0.5);
        assert_eq!(producer.max_load_at(2), 0.0);
    }

    #[test]
    fn interconnect_with_flat_capacity() {
        let price = Curve::from_values(vec![30.0, 45.0]);
        let producer = Producer::interconnect("import_from_de", price, 2450.0, 2);
        assert!(producer.is_dispatchable());
        assert_eq!(producer.max_load_at(0), 2450.0);
        assert_eq!(producer.chunk_at(0), 2450.0);
        assert_eq!(producer.sortable_cost(1), 45.0);
    }

    #[test]
    fn interconnect_with_varying_capacity() {
        let price = Curve::flat(2, 30.0);
        let limit = Curve::from_values(vec![100.0, 0.0]);
        let producer = Producer::interconnect("import_from_de", price, limit, 2);
        assert_eq!(producer.max_load_at(0), 100.0);
        assert_eq!(producer.max_load_at(1), 0.0);
    }

    #[test]
    fn cost_function_sortable_cost_tracks_assigned_load() {
        let mut producer =
            Producer::dispatchable("gas", CostModel::function(10.0, 0.2), 10.0, 10.0, 1.0, 1);
        assert_eq!(producer.sortable_cost(0), 9.0);
        producer.assign(0, 50.0);
        assert_eq!(producer.sortable_cost(0), 10.0);
    }

    #[test]
    fn constant_cost_producer_is_always_price_setting() {
        let producer = Producer::dispatchable("gas", CostModel::constant(20.0), 10.0, 1.0, 1.0, 1);
        assert!(producer.price_setting(0));
    }

    #[test]
    fn cost_function_price_setting_needs_spare_capacity() {
        let mut producer =
            Producer::dispatchable("gas", CostModel::function(20.0, 0.02), 0.1, 2.0, 1.0, 1);
        assert!(producer.price_setting(0));

        // Partially loaded: still price-setting.
        producer.assign(0, 0.15);
        assert!(producer.price_setting(0));

        // Filled to the maximum: passes price-setting on.
        producer.assign(0, 0.05);
        assert!(!producer.price_setting(0));
    }

    #[test]
    fn cleared_resets_the_load_curve() {
        let mut producer =
            Producer::dispatchable("gas", CostModel::constant(20.0), 10.0, 1.0, 1.0, 2);
        producer.assign(1, 5.0);
        let fresh = producer.cleared();
        assert_eq!(fresh.load_at(1), 0.0);
        assert_eq!(fresh.key(), "gas");
    }
}
