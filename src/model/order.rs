//! Orders (uncalculated markets) and dispatch results.

use super::curve::Curve;
use super::producer::{Producer, Role, User};

/// One market over one horizon, before calculation: the producers that can
/// supply and the users whose demand must be covered.
///
/// An order is consumed exactly once by
/// [`DispatchEngine::calculate`](crate::dispatch::DispatchEngine::calculate),
/// which moves it into an immutable [`Dispatch`].
#[derive(Debug, Clone)]
pub struct Order {
    points: usize,
    producers: Vec<Producer>,
    users: Vec<User>,
}

impl Order {
    /// Creates an empty order over a horizon of `points` steps.
    ///
    /// # Panics
    ///
    /// Panics if `points` is zero.
    pub fn new(points: usize) -> Self {
        assert!(points > 0, "horizon must have at least one point");
        Self {
            points,
            producers: Vec::new(),
            users: Vec::new(),
        }
    }

    /// Number of points in the horizon.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Adds a producer.
    ///
    /// # Panics
    ///
    /// Panics if the producer's load curve length differs from the
    /// order's horizon.
    pub fn add_producer(&mut self, producer: Producer) {
        assert_eq!(
            producer.load_curve().len(),
            self.points,
            "producer {} horizon mismatch",
            producer.key()
        );
        self.producers.push(producer);
    }

    /// Adds a demand user.
    ///
    /// # Panics
    ///
    /// Panics if the user's demand curve length differs from the order's
    /// horizon.
    pub fn add_user(&mut self, user: User) {
        assert_eq!(
            user.demand_curve().len(),
            self.points,
            "user {} horizon mismatch",
            user.key()
        );
        self.users.push(user);
    }

    /// All producers, in insertion order.
    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// All users, in insertion order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Total raw demand at `point`: the sum of all user curves.
    pub fn demand_at(&self, point: usize) -> f64 {
        self.users.iter().map(|user| user.load_at(point)).sum()
    }

    pub(crate) fn always_on_indices(&self) -> Vec<usize> {
        self.indices_with_role(Role::AlwaysOn)
    }

    pub(crate) fn dispatchable_indices(&self) -> Vec<usize> {
        self.indices_with_role(Role::Dispatchable)
    }

    fn indices_with_role(&self, role: Role) -> Vec<usize> {
        self.producers
            .iter()
            .enumerate()
            .filter(|(_, producer)| producer.role() == role)
            .map(|(index, _)| index)
            .collect()
    }

    pub(crate) fn assign(&mut self, index: usize, point: usize, amount: f64) {
        self.producers[index].assign(point, amount);
    }

    pub(crate) fn set_load(&mut self, index: usize, point: usize, value: f64) {
        self.producers[index].set_load(point, value);
    }
}

/// A point where demand exceeded total dispatchable capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    /// The affected point.
    pub point: usize,
    /// Demand left unserved after every producer was exhausted.
    pub missing: f64,
}

/// A calculated market: producers with filled load curves, the derived
/// price curve, the price-setting producer per point, and any capacity
/// shortfalls.
///
/// Immutable for all downstream consumers. Points with a shortfall carry
/// no price-setting producer and price at the engine's emergency price.
#[derive(Debug, Clone)]
pub struct Dispatch {
    points: usize,
    producers: Vec<Producer>,
    users: Vec<User>,
    price: Curve,
    setters: Vec<Option<usize>>,
    shortfalls: Vec<Shortfall>,
}

impl Dispatch {
    pub(crate) fn new(
        order: Order,
        price: Curve,
        setters: Vec<Option<usize>>,
        shortfalls: Vec<Shortfall>,
    ) -> Self {
        Self {
            points: order.points,
            producers: order.producers,
            users: order.users,
            price,
            setters,
            shortfalls,
        }
    }

    /// Number of points in the horizon.
    pub fn points(&self) -> usize {
        self.points
    }

    /// All producers with their filled load curves.
    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// All users.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Dispatchable producers, in insertion order.
    pub fn dispatchables(&self) -> impl Iterator<Item = &Producer> {
        self.producers
            .iter()
            .filter(|producer| producer.is_dispatchable())
    }

    /// Looks up a producer by key.
    pub fn producer(&self, key: &str) -> Option<&Producer> {
        self.producers.iter().find(|producer| producer.key() == key)
    }

    /// Looks up a user by key.
    pub fn user(&self, key: &str) -> Option<&User> {
        self.users.iter().find(|user| user.key() == key)
    }

    /// Market price at `point`: the cost of the price-setting producer,
    /// or the engine's emergency price when a shortfall left the point
    /// without one.
    pub fn price_at(&self, point: usize) -> f64 {
        self.price.get(point)
    }

    /// The full price curve.
    pub fn price_curve(&self) -> &Curve {
        &self.price
    }

    /// The price-setting producer at `point`, if any.
    pub fn price_setter(&self, point: usize) -> Option<&Producer> {
        self.setters[point].map(|index| &self.producers[index])
    }

    /// Total raw demand at `point`.
    pub fn demand_at(&self, point: usize) -> f64 {
        self.users.iter().map(|user| user.load_at(point)).sum()
    }

    /// Points where demand exceeded available capacity.
    pub fn shortfalls(&self) -> &[Shortfall] {
        &self.shortfalls
    }

    /// Whether every point was fully served.
    pub fn is_fully_dispatched(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CostModel;

    #[test]
    fn demand_sums_all_users() {
        let mut order = Order::new(2);
        order.add_user(User::new("homes", Curve::from_values(vec![1.0, 2.0])));
        order.add_user(User::new("industry", Curve::from_values(vec![0.5, 0.5])));
        assert_eq!(order.demand_at(0), 1.5);
        assert_eq!(order.demand_at(1), 2.5);
    }

    #[test]
    fn role_partitioning() {
        let mut order = Order::new(2);
        order.add_producer(Producer::always_on("wind", Curve::flat(2, 1.0)));
        order.add_producer(Producer::dispatchable(
            "gas",
            CostModel::constant(20.0),
            1.0,
            1.0,
            1.0,
            2,
        ));
        assert_eq!(order.always_on_indices(), vec![0]);
        assert_eq!(order.dispatchable_indices(), vec![1]);
    }

    #[test]
    #[should_panic]
    fn mismatched_horizon_is_rejected() {
        let mut order = Order::new(2);
        order.add_user(User::new("homes", Curve::zeroes(3)));
    }
}
