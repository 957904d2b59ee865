//! Merit-order electricity dispatch with two-pass cross-border trade
//! convergence.

/// Study configuration.
pub mod config;
/// Export analysis and the two-pass convergence runner.
pub mod convergence;
/// Cost helpers and the greedy dispatch engine.
pub mod dispatch;
/// Region archives and CSV reports.
pub mod io;
/// Curves, cost models, producers, orders, and regions.
pub mod model;
