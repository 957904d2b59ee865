//! The merit-order dispatch engine.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::warn;

use crate::model::{Curve, Dispatch, Order, Shortfall};

use super::costing::producer_cost;

/// Residual demand below this threshold is treated as floating-point
/// residue and clamped to zero.
pub const EPSILON: f64 = 1e-10;

/// Price applied to points where a capacity shortfall left no
/// price-setting producer.
pub const DEFAULT_EMERGENCY_PRICE: f64 = 600.0;

/// Errors raised while calculating an order.
///
/// Both variants abort the whole calculation; there is no retry or
/// partial-failure recovery.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Raw demand at a point was negative, indicating corrupt upstream
    /// data.
    #[error("demand at point {point} is negative ({demand})")]
    NegativeDemand {
        /// The offending point.
        point: usize,
        /// The negative demand value.
        demand: f64,
    },
    /// The chunk-assignment loop failed to terminate within its bound.
    #[error("point {point} exceeded the chunk-assignment guard of {limit} iterations")]
    IterationLimit {
        /// The offending point.
        point: usize,
        /// The iteration bound that was exceeded.
        limit: usize,
    },
}

/// Executes one full merit-order calculation.
///
/// For every point of the horizon, demand is assigned greedily to
/// producers in ascending-cost order. Cost-function producers receive
/// load one capacity chunk at a time and are re-inserted into the queue
/// at their new cost, so a producer whose cost rises past a competitor's
/// yields the remainder of the demand to it.
///
/// Each point touches only its own index of every load curve, so points
/// are independent of one another; within a point, assignment is strictly
/// sequential. Engines carry no ambient global state: every calculation
/// receives its engine explicitly.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    epsilon: f64,
    emergency_price: f64,
    iteration_limit: Option<usize>,
}

impl Default for DispatchEngine {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            emergency_price: DEFAULT_EMERGENCY_PRICE,
            iteration_limit: None,
        }
    }
}

impl DispatchEngine {
    /// Creates an engine with the default epsilon and emergency price.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with a custom emergency price.
    pub fn with_emergency_price(emergency_price: f64) -> Self {
        Self {
            emergency_price,
            ..Self::default()
        }
    }

    /// Creates an engine with a fixed per-point chunk-iteration bound,
    /// replacing the bound derived from the order's unit counts.
    pub fn with_iteration_limit(limit: usize) -> Self {
        Self {
            iteration_limit: Some(limit),
            ..Self::default()
        }
    }

    /// The price applied to shortfall points.
    pub fn emergency_price(&self) -> f64 {
        self.emergency_price
    }

    /// Calculates the order, consuming it and returning the immutable
    /// result.
    ///
    /// Always-on producers are loaded unconditionally to their maximum;
    /// the residual demand is assigned to the dispatchable producers by
    /// the greedy loop. Points where demand exceeds total capacity are
    /// recorded as [`Shortfall`]s rather than raised as errors: the point
    /// has no price-setting producer and prices at the emergency price.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NegativeDemand`] if raw demand is negative
    /// at any point, and [`DispatchError::IterationLimit`] if the chunk
    /// loop fails to terminate.
    pub fn calculate(&self, mut order: Order) -> Result<Dispatch, DispatchError> {
        let points = order.points();
        let mut setters: Vec<Option<usize>> = vec![None; points];
        let mut shortfalls = Vec::new();

        for point in 0..points {
            if let Some(shortfall) = self.compute_point(&mut order, point, &mut setters)? {
                warn!(
                    point = shortfall.point,
                    missing = shortfall.missing,
                    "capacity shortfall"
                );
                shortfalls.push(shortfall);
            }
        }

        let mut price = Curve::zeroes(points);
        for point in 0..points {
            let value = match setters[point] {
                Some(index) => producer_cost(&order.producers()[index], point),
                None => self.emergency_price,
            };
            price.set(point, value);
        }

        Ok(Dispatch::new(order, price, setters, shortfalls))
    }

    /// Assigns the demand of a single point.
    ///
    /// Returns `Ok(Some(Shortfall))` when every producer was exhausted
    /// with demand left over.
    fn compute_point(
        &self,
        order: &mut Order,
        point: usize,
        setters: &mut [Option<usize>],
    ) -> Result<Option<Shortfall>, DispatchError> {
        let mut remaining = order.demand_at(point);
        if remaining < 0.0 {
            return Err(DispatchError::NegativeDemand {
                point,
                demand: remaining,
            });
        }

        for index in order.always_on_indices() {
            let max_load = order.producers()[index].max_load_at(point);
            order.set_load(index, point, max_load);
            remaining -= max_load;
        }

        let mut transients: VecDeque<usize> = {
            let mut indices = order.dispatchable_indices();
            indices.sort_by(|&a, &b| {
                producer_cost(&order.producers()[a], point)
                    .total_cmp(&producer_cost(&order.producers()[b], point))
            });
            indices.into()
        };

        // A correct run needs at most one iteration per chunk plus one
        // skip per producer; anything beyond that means the residual is
        // failing to converge.
        let limit = self.iteration_limit.unwrap_or_else(|| {
            2 * transients
                .iter()
                .map(|&index| order.producers()[index].whole_units())
                .sum::<usize>()
                + transients.len()
                + 16
        });
        let mut iterations = 0;

        while let Some(index) = transients.pop_front() {
            iterations += 1;
            if iterations > limit {
                return Err(DispatchError::IterationLimit { point, limit });
            }

            let producer = &order.producers()[index];
            let max_load = producer.max_load_at(point);

            if max_load == 0.0 {
                continue;
            }

            let current = producer.load_at(point);
            let headroom = max_load - current;
            let chunk = producer.chunk_at(point);

            if remaining < self.epsilon {
                remaining = 0.0;
            }

            if headroom == 0.0 {
                continue;
            }

            if headroom <= remaining && headroom < chunk {
                // Less than one unit of capacity left: saturate and move on.
                order.assign(index, point, headroom);
                remaining -= headroom;
            } else if remaining > chunk {
                // Assign one plant's worth of load, then re-insert before
                // the first producer that is now at least as expensive.
                // A linear scan beats re-sorting since only this
                // producer's position changed.
                order.assign(index, point, chunk);
                remaining -= chunk;

                let cost = producer_cost(&order.producers()[index], point);
                let insert_at = transients
                    .iter()
                    .position(|&other| producer_cost(&order.producers()[other], point) >= cost)
                    .unwrap_or(transients.len());
                transients.insert(insert_at, index);
            } else if remaining > 0.0 {
                // Final partial assignment.
                order.assign(index, point, remaining);

                if order.producers()[index].price_setting(point) {
                    setters[point] = Some(index);
                    return Ok(None);
                }

                // The next producer will be price-setting.
                remaining = 0.0;
            } else {
                // Demand satisfied: this producer is the marginal plant
                // even though it received no new load.
                setters[point] = Some(index);
                return Ok(None);
            }
        }

        if remaining < self.epsilon {
            remaining = 0.0;
        }

        if remaining > 0.0 {
            return Ok(Some(Shortfall {
                point,
                missing: remaining,
            }));
        }

        Ok(None)
    }
}
