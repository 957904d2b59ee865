//! Cross-border trade convergence: export analysis and the two-pass runner.

pub mod analyzer;
pub mod runner;

pub use analyzer::ExportAnalyzer;
pub use runner::{ConvergenceError, ConvergenceRunner, Phase};
