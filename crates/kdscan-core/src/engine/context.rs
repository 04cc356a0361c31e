use super::cancel::CancellationToken;
use super::config::SweepConfig;
use super::fitter::FitEngine;
use super::progress::ProgressReporter;
use super::workspace::Workspace;
use crate::core::models::curve::ScatteringCurve;
use std::path::PathBuf;

/// One experimental dataset and the concentration it was measured at.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalInput {
    pub path: PathBuf,
    pub concentration: f64,
}

/// Shared, read-only state of a running sweep.
///
/// Every trial borrows the same context; nothing in it is mutated while the
/// sweep runs, so trials can execute on any number of worker threads.
#[derive(Clone, Copy)]
pub struct SweepContext<'a> {
    pub config: &'a SweepConfig,
    /// One curve per species, in the model's species order.
    pub species: &'a [ScatteringCurve],
    pub fit_engine: &'a dyn FitEngine,
    pub workspace: &'a dyn Workspace,
    pub reporter: &'a ProgressReporter<'a>,
    pub cancel: &'a CancellationToken,
}

impl<'a> SweepContext<'a> {
    pub fn new(
        config: &'a SweepConfig,
        species: &'a [ScatteringCurve],
        fit_engine: &'a dyn FitEngine,
        workspace: &'a dyn Workspace,
        reporter: &'a ProgressReporter<'a>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            config,
            species,
            fit_engine,
            workspace,
            reporter,
            cancel,
        }
    }

    /// Artifact stem of a trial, `<concentration>_<kd>` at fixed precision.
    pub fn artifact_stem(&self, concentration: f64, kd: f64) -> String {
        format!(
            "{}_{}",
            self.config.format_concentration(concentration),
            self.config.grid.format_kd(kd)
        )
    }
}
