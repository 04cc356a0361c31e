//! Fixtures shared by the engine and workflow tests.

use crate::core::equilibrium::{EquilibriumInput, EquilibriumSolver};
use crate::core::io::dat::{DatFile, ExperimentalCurve};
use crate::core::io::fit::{FitCurve, FitFile};
use crate::core::io::int::IntFile;
use crate::core::io::traits::CurveFile;
use crate::core::models::binding::{BindingModel, ModelKind};
use crate::core::models::curve::ScatteringCurve;
use crate::engine::config::{SweepConfig, SweepConfigBuilder};
use crate::engine::fitter::{FitEngine, FitEngineError, FitOutcome, FitRequest};
use crate::engine::workspace::Workspace;
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub(crate) fn q_grid() -> Vec<f64> {
    (0..30).map(|i| 0.01 + 0.01 * i as f64).collect()
}

pub(crate) fn species_curves() -> Vec<ScatteringCurve> {
    let q = q_grid();
    let monomer = q.iter().map(|q| 100.0 * (-(q * 20.0).powi(2) / 3.0).exp()).collect();
    let oligomer = q.iter().map(|q| 200.0 * (-(q * 35.0).powi(2) / 3.0).exp()).collect();
    vec![
        ScatteringCurve::new(q.clone(), monomer).unwrap(),
        ScatteringCurve::new(q, oligomer).unwrap(),
    ]
}

/// Monomer-dimer sweep over 0.1..1000 with two-decimal Kd values.
pub(crate) fn sweep_config(points: usize) -> SweepConfig {
    SweepConfigBuilder::new()
        .model_kind(ModelKind::MonomerOligomer)
        .stoichiometry(2)
        .kd_range(0.1, 1000.0)
        .kd_points(points)
        .build()
        .unwrap()
}

/// The theoretical mixture a model predicts at one concentration and Kd.
pub(crate) fn target_mixture(model: &BindingModel, concentration: f64, kd: f64) -> ScatteringCurve {
    let state = model.solve(EquilibriumInput { concentration, kd });
    ScatteringCurve::mix(&species_curves(), state.fractions().unwrap()).unwrap()
}

/// Writes `curve` as a three-column dataset with unit uncertainties.
pub(crate) fn write_experiment(dir: &Path, name: &str, curve: &ScatteringCurve) -> PathBuf {
    let path = dir.join(name);
    let data = ExperimentalCurve {
        curve: curve.clone(),
        sigma: vec![1.0; curve.len()],
    };
    DatFile::write_to_path(&data, &path).unwrap();
    path
}

/// Scores a theoretical curve by its squared distance to a known target.
///
/// Deterministic, so a sweep's minimum sits exactly at the Kd the target was
/// generated with. Requests for unknown experimental paths fail.
pub(crate) struct TargetFitEngine {
    targets: Vec<(PathBuf, ScatteringCurve)>,
    max_chi_squared: Option<f64>,
}

impl TargetFitEngine {
    pub(crate) fn new() -> Self {
        Self {
            targets: Vec::new(),
            max_chi_squared: None,
        }
    }

    pub(crate) fn for_experiment(
        model: &BindingModel,
        path: impl Into<PathBuf>,
        concentration: f64,
        kd: f64,
    ) -> Self {
        Self::new().with_target(path, target_mixture(model, concentration, kd))
    }

    pub(crate) fn with_target(mut self, path: impl Into<PathBuf>, curve: ScatteringCurve) -> Self {
        self.targets.push((path.into(), curve));
        self
    }

    /// Fails every fit whose chi-squared would exceed `limit`.
    pub(crate) fn failing_above(mut self, limit: f64) -> Self {
        self.max_chi_squared = Some(limit);
        self
    }
}

impl FitEngine for TargetFitEngine {
    fn name(&self) -> &str {
        "target"
    }

    fn check_available(&self) -> Result<(), FitEngineError> {
        Ok(())
    }

    fn fit(
        &self,
        request: &FitRequest,
        workspace: &dyn Workspace,
    ) -> Result<FitOutcome, FitEngineError> {
        let (_, target) = self
            .targets
            .iter()
            .find(|(path, _)| *path == request.experimental)
            .ok_or_else(|| FitEngineError::Unavailable("no such experiment".to_string()))?;

        let text = workspace.read_artifact(&request.theoretical)?;
        let theoretical = IntFile::read_from(&mut Cursor::new(text)).unwrap();
        let chi_squared = 1.0
            + theoretical
                .intensity()
                .iter()
                .zip(target.intensity())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                / target.len() as f64;

        if self.max_chi_squared.is_some_and(|limit| chi_squared > limit) {
            return Err(FitEngineError::NonZeroExit {
                code: Some(1),
                stderr: "fit diverged".to_string(),
            });
        }

        let fit = FitCurve {
            q: target.q().to_vec(),
            experimental: target.intensity().to_vec(),
            sigma: vec![1.0; target.len()],
            fitted: theoretical.intensity().to_vec(),
        };
        workspace.write_artifact(&request.fit, &FitFile::to_text(&fit).unwrap())?;
        Ok(FitOutcome { chi_squared })
    }
}

pub(crate) struct UnavailableFitEngine;

impl FitEngine for UnavailableFitEngine {
    fn name(&self) -> &str {
        "missing"
    }

    fn check_available(&self) -> Result<(), FitEngineError> {
        Err(FitEngineError::Unavailable("not installed".to_string()))
    }

    fn fit(&self, _: &FitRequest, _: &dyn Workspace) -> Result<FitOutcome, FitEngineError> {
        Err(FitEngineError::Unavailable("not installed".to_string()))
    }
}
