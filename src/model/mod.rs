//! Data model: curves, cost strategies, producers, orders, and regions.

pub mod cost;
pub mod curve;
pub mod order;
pub mod producer;
pub mod region;

// Re-export the main types for convenience
pub use cost::CostModel;
pub use curve::{Curve, Series};
pub use order::{Dispatch, Order, Shortfall};
pub use producer::{Capacity, Producer, Role, User};
pub use region::Region;
