//! Two-pass cross-border convergence orchestration.

use thiserror::Error;
use tracing::debug;

use crate::dispatch::{DispatchEngine, DispatchError};
use crate::model::{Curve, Dispatch, Order, Producer, Region, Series, User};

use super::analyzer::ExportAnalyzer;

/// Errors raised while configuring or running a convergence analysis.
#[derive(Debug, Error)]
pub enum ConvergenceError {
    /// A second real interconnect was registered; only one
    /// bidirectionally-priced interconnect is supported at a time.
    #[error("an interconnect to {existing} is already registered")]
    InterconnectExists {
        /// Code of the region the existing interconnect links to.
        existing: String,
    },
    /// A result was requested before `run` completed.
    #[error("no convergence run has completed yet")]
    NotCalculated,
    /// No interconnect or export to the named region exists.
    #[error("no interconnect or export to region {region}")]
    UnknownRegion {
        /// The unrecognized region code.
        region: String,
    },
    /// A dispatch calculation failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Progress of a convergence run. Phases advance linearly and the final
/// phase is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing calculated yet.
    Uninitialized,
    /// The foreign region has been dispatched standalone.
    OtherOrdersCalculated,
    /// The local region has been dispatched without analyzed export.
    FirstPassCalculated,
    /// Exportable surplus has been derived from the first pass.
    ExportsAnalyzed,
    /// The final result is available.
    SecondPassCalculated,
}

struct Interconnect {
    foreign: Region,
    capacity: Series,
}

/// Orchestrates the two-pass convergence analysis.
///
/// The foreign market is dispatched standalone, the local market is
/// dispatched with an import option priced at the foreign price curve,
/// the exportable surplus is analyzed, and the local market is dispatched
/// once more with that export as additional demand. Exactly two passes:
/// this is an approximation, not an equilibrium solver.
pub struct ConvergenceRunner {
    local: Region,
    interconnect: Option<Interconnect>,
    fixed_exports: Vec<(String, Curve)>,
    phase: Phase,
    foreign_result: Option<Dispatch>,
    first_pass: Option<Dispatch>,
    second_pass: Option<Dispatch>,
}

impl ConvergenceRunner {
    /// Creates a runner for the given local region.
    pub fn new(local: Region) -> Self {
        Self {
            local,
            interconnect: None,
            fixed_exports: Vec::new(),
            phase: Phase::Uninitialized,
            foreign_result: None,
            first_pass: None,
            second_pass: None,
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Registers the price-coupled interconnect to a foreign region.
    ///
    /// # Errors
    ///
    /// Returns [`ConvergenceError::InterconnectExists`] on a second call;
    /// only one real interconnect is supported at a time.
    pub fn add_interconnect(
        &mut self,
        foreign: Region,
        capacity: impl Into<Series>,
    ) -> Result<(), ConvergenceError> {
        if let Some(existing) = &self.interconnect {
            return Err(ConvergenceError::InterconnectExists {
                existing: existing.foreign.code().to_string(),
            });
        }

        self.interconnect = Some(Interconnect {
            foreign,
            capacity: capacity.into(),
        });
        Ok(())
    }

    /// Registers a fixed export demand to a region, independent of price
    /// coupling. Used for externally supplied export schedules; the run
    /// itself registers the analyzed export curve through the same path.
    /// Registering the same region again replaces the earlier curve.
    pub fn add_export(&mut self, region_code: &str, load_curve: Curve) {
        if let Some(entry) = self
            .fixed_exports
            .iter_mut()
            .find(|(code, _)| code == region_code)
        {
            entry.1 = load_curve;
        } else {
            self.fixed_exports.push((region_code.to_string(), load_curve));
        }
    }

    /// Runs the two-pass analysis and returns the final dispatch.
    ///
    /// Idempotent: once a run has completed, subsequent calls return the
    /// cached result without recomputation.
    ///
    /// # Errors
    ///
    /// Propagates any [`DispatchError`] from the underlying calculations.
    pub fn run(&mut self, engine: &DispatchEngine) -> Result<&Dispatch, ConvergenceError> {
        if self.second_pass.is_none() {
            self.calculate_foreign(engine)?;
            self.first_run(engine)?;
            self.analyze_exports();
            self.second_run(engine)?;
        }

        match &self.second_pass {
            Some(dispatch) => Ok(dispatch),
            None => Err(ConvergenceError::NotCalculated),
        }
    }

    /// The foreign region's standalone dispatch, once calculated.
    pub fn foreign_result(&self) -> Option<&Dispatch> {
        self.foreign_result.as_ref()
    }

    /// The local first-pass dispatch, once calculated.
    pub fn first_pass(&self) -> Option<&Dispatch> {
        self.first_pass.as_ref()
    }

    /// The final dispatch, once calculated.
    pub fn result(&self) -> Option<&Dispatch> {
        self.second_pass.as_ref()
    }

    /// Net interconnect flow to `region` per point: negative for import,
    /// positive for export, zero otherwise. Import and export are never
    /// simultaneously non-zero at the same point by construction.
    ///
    /// # Errors
    ///
    /// Returns [`ConvergenceError::NotCalculated`] before a completed run
    /// and [`ConvergenceError::UnknownRegion`] if no interconnect or
    /// export to `region` exists.
    pub fn interconnect_flow(&self, region: &str) -> Result<Curve, ConvergenceError> {
        let second = self
            .second_pass
            .as_ref()
            .ok_or(ConvergenceError::NotCalculated)?;

        let importer = second.producer(&import_key(region));
        let exporter = second.user(&export_key(region));

        if importer.is_none() && exporter.is_none() {
            return Err(ConvergenceError::UnknownRegion {
                region: region.to_string(),
            });
        }

        let mut flow = Curve::zeroes(second.points());
        for point in 0..second.points() {
            let import = importer.map_or(0.0, |producer| producer.load_at(point));
            let export = exporter.map_or(0.0, |user| user.load_at(point));

            if import > 0.0 {
                flow.set(point, -import);
            } else if export > 0.0 {
                flow.set(point, export);
            }
        }

        Ok(flow)
    }

    /// Dispatches the local region with no interconnects at all: the
    /// reference baseline excluding any cross-border trade.
    pub fn standalone(&self, engine: &DispatchEngine) -> Result<Dispatch, DispatchError> {
        engine.calculate(self.local.order())
    }

    fn calculate_foreign(&mut self, engine: &DispatchEngine) -> Result<(), ConvergenceError> {
        if let Some(interconnect) = &self.interconnect {
            let dispatch = engine.calculate(interconnect.foreign.order())?;
            debug!(region = interconnect.foreign.code(), "foreign region dispatched");
            self.foreign_result = Some(dispatch);
        }
        self.phase = Phase::OtherOrdersCalculated;
        Ok(())
    }

    fn first_run(&mut self, engine: &DispatchEngine) -> Result<(), ConvergenceError> {
        let order = self.linked_order();
        self.first_pass = Some(engine.calculate(order)?);
        self.phase = Phase::FirstPassCalculated;
        debug!("first pass dispatched");
        Ok(())
    }

    fn analyze_exports(&mut self) {
        if let (Some(interconnect), Some(first), Some(foreign)) =
            (&self.interconnect, &self.first_pass, &self.foreign_result)
        {
            let analysis = ExportAnalyzer::new(first, foreign, interconnect.capacity.clone());
            let curve = analysis.load_curve();
            let code = interconnect.foreign.code().to_string();
            debug!(region = code.as_str(), total = curve.sum(), "export analyzed");
            self.add_export(&code, curve);
        }
        self.phase = Phase::ExportsAnalyzed;
    }

    fn second_run(&mut self, engine: &DispatchEngine) -> Result<(), ConvergenceError> {
        let order = self.linked_order();
        self.second_pass = Some(engine.calculate(order)?);
        self.phase = Phase::SecondPassCalculated;
        debug!("second pass dispatched");
        Ok(())
    }

    /// Builds a fresh local order with the import pseudo-producer and all
    /// registered export demand curves.
    fn linked_order(&self) -> Order {
        let mut order = self.local.order();
        let points = self.local.points();

        if let (Some(interconnect), Some(foreign)) = (&self.interconnect, &self.foreign_result) {
            order.add_producer(Producer::interconnect(
                import_key(interconnect.foreign.code()),
                foreign.price_curve().clone(),
                interconnect.capacity.clone(),
                points,
            ));
        }

        for (code, curve) in &self.fixed_exports {
            order.add_user(User::new(export_key(code), curve.clone()));
        }

        order
    }
}

fn import_key(region: &str) -> String {
    format!("import_from_{region}")
}

fn export_key(region: &str) -> String {
    format!("export_to_{region}")
}
