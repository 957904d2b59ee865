//! Merit-order dispatch: cost helpers and the greedy per-point engine.

pub mod costing;
pub mod engine;

pub use costing::{competitive_load, producer_cost};
pub use engine::{DEFAULT_EMERGENCY_PRICE, DispatchEngine, DispatchError, EPSILON};
