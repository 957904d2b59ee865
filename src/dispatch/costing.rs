//! Cost helpers used by the dispatch engine and the export analyzer.

use crate::model::Producer;

/// Marginal cost of `producer` at `point`, accounting for the load it has
/// already been assigned. Constant-cost producers return their per-point
/// cost; cost-function producers return the cost at their current load.
pub fn producer_cost(producer: &Producer, point: usize) -> f64 {
    if producer.cost().is_function() {
        producer.cost_at_load(producer.load_at(point), point)
    } else {
        producer.sortable_cost(point)
    }
}

/// Maximum load `producer` can supply at `point` without its marginal
/// cost exceeding `limiting_cost`.
///
/// Constant-cost producers are binary: everything or nothing. For
/// cost-function producers the supply curve is climbed one capacity chunk
/// at a time, returning the highest whole-chunk level still at or below
/// the limit. The result is never interpolated, so it stays correct for
/// arbitrary monotonic cost curves at a granularity of one plant.
pub fn competitive_load(producer: &Producer, point: usize, limiting_cost: f64) -> f64 {
    let max_load = producer.max_load_at(point);

    if !producer.cost().is_function() {
        return if producer.sortable_cost(point) > limiting_cost {
            0.0
        } else {
            max_load
        };
    }

    let chunk = producer.chunk_at(point);
    if chunk <= 0.0 {
        return 0.0;
    }

    let mut load = 0.0;
    loop {
        let next = load + chunk;
        if next > max_load || producer.cost_at_load(next, point) > limiting_cost {
            return load;
        }
        load = next;
    }
}
