use crate::core::analysis::LCurveResult;
use crate::core::equilibrium::profile::{self, FractionProfile};
use crate::core::io::fit::{FitCurve, FitFile};
use crate::core::io::traits::CurveFile;
use crate::core::models::chi2::{AveragedCurve, ChiSquaredCurve};
use crate::core::models::curve::ScatteringCurve;
use crate::engine::cache::LCurveCache;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::{ConfigError, SweepConfig};
use crate::engine::context::{ExperimentalInput, SweepContext};
use crate::engine::error::EngineError;
use crate::engine::fitter::FitEngine;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks;
use crate::engine::workspace::{ArtifactKind, Workspace};
use std::io::Cursor;
use tracing::{info, instrument, warn};

/// Curves supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct SweepInputs {
    pub experiments: Vec<ExperimentalInput>,
    /// Theoretical profiles per species, in the model's species order.
    /// Several profiles of one species are averaged before the sweep.
    pub species: Vec<Vec<ScatteringCurve>>,
}

/// The lowest chi-squared trial at one concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct BestFit {
    pub concentration: f64,
    pub kd: f64,
    pub chi_squared: f64,
    /// `None` when the fit engine left no readable fit curve.
    pub fit: Option<FitCurve>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationAnalysis {
    pub concentration: f64,
    pub analysis: Option<LCurveResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub curves: Vec<ChiSquaredCurve>,
    pub averaged: AveragedCurve,
    /// Analysis of the concentration-averaged curve.
    pub analysis: LCurveResult,
    pub per_concentration: Vec<ConcentrationAnalysis>,
    pub best_fits: Vec<BestFit>,
    /// Species fractions at the estimated optimal Kd.
    pub profile: FractionProfile,
}

#[instrument(skip_all, name = "sweep_workflow")]
pub fn run(
    config: &SweepConfig,
    inputs: &SweepInputs,
    fit_engine: &dyn FitEngine,
    workspace: &dyn Workspace,
    cache: &mut LCurveCache,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<SweepResult, EngineError> {
    // === Phase 0: Preparation and validation ===
    let species = stage(reporter, "Preparation", || {
        info!(model = %config.model, kd_points = config.grid.len(), "Preparing Kd sweep.");
        let species = average_species(config, &inputs.species)?;
        let context = SweepContext::new(config, &species, fit_engine, workspace, reporter, cancel);
        tasks::kd_sweep::check_preconditions(&context, &inputs.experiments)?;
        Ok(species)
    })?;
    let context = SweepContext::new(config, &species, fit_engine, workspace, reporter, cancel);

    // === Phase 1: One Kd sweep per concentration ===
    let mut curves = Vec::with_capacity(inputs.experiments.len());
    for experiment in &inputs.experiments {
        curves.push(tasks::kd_sweep::run(&context, experiment)?);
    }

    // === Phase 2: Averaging and L-curve analysis ===
    let (averaged, analysis, per_concentration) = stage(reporter, "L-curve analysis", || {
        let averaged = AveragedCurve::from_curves(&curves);
        let analysis = cache.get_or_compute(&averaged, Some(&config.model))?.clone();
        if !analysis.is_confident() {
            let reasons: Vec<String> = analysis.reasons.iter().map(ToString::to_string).collect();
            warn!(reasons = %reasons.join("; "), "L-curve estimate has low confidence.");
        }
        let per_concentration = curves
            .iter()
            .map(|curve| analyze_single(cache, config, curve))
            .collect::<Vec<_>>();
        Ok((averaged, analysis, per_concentration))
    })?;

    // === Phase 3: Best fits and fraction profile ===
    let best_fits = curves
        .iter()
        .filter_map(|curve| best_fit(&context, curve))
        .collect();
    let concentrations = config.profile.grid().map_err(ConfigError::from)?;
    let profile = profile::generate(&config.model, analysis.optimal_kd, &concentrations);

    info!(
        optimal_kd = analysis.optimal_kd,
        kd_error = ?analysis.kd_error,
        confidence = ?analysis.confidence,
        "Sweep workflow complete."
    );
    Ok(SweepResult {
        curves,
        averaged,
        analysis,
        per_concentration,
        best_fits,
        profile,
    })
}

/// Runs `body` between a stage's start and finish events.
fn stage<T>(
    reporter: &ProgressReporter,
    name: &str,
    body: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    reporter.report(Progress::StageStart {
        name: name.to_string(),
    });
    let result = body();
    reporter.report(Progress::StageFinish);
    result
}

fn average_species(
    config: &SweepConfig,
    species: &[Vec<ScatteringCurve>],
) -> Result<Vec<ScatteringCurve>, EngineError> {
    let labels = config.model.species_labels();
    species
        .iter()
        .enumerate()
        .map(|(index, profiles)| {
            let label = labels.get(index).map(String::as_str).unwrap_or("extra");
            if profiles.is_empty() {
                return Err(EngineError::MissingInput(format!(
                    "theoretical profiles for species '{}'",
                    label
                )));
            }
            ScatteringCurve::average(profiles).map_err(|e| {
                EngineError::InvalidInput(format!("profiles of species '{}': {}", label, e))
            })
        })
        .collect()
}

fn analyze_single(
    cache: &mut LCurveCache,
    config: &SweepConfig,
    curve: &ChiSquaredCurve,
) -> ConcentrationAnalysis {
    let single = AveragedCurve::from_curves(std::slice::from_ref(curve));
    let analysis = match cache.get_or_compute(&single, Some(&config.model)) {
        Ok(result) => Some(result.clone()),
        Err(error) => {
            warn!(concentration = curve.concentration, %error, "Skipping per-concentration analysis.");
            None
        }
    };
    ConcentrationAnalysis {
        concentration: curve.concentration,
        analysis,
    }
}

fn best_fit(context: &SweepContext, curve: &ChiSquaredCurve) -> Option<BestFit> {
    let record = curve.best_fit()?;
    let chi_squared = record.chi_squared?;
    let stem = context.artifact_stem(curve.concentration, record.kd);
    let path = context.workspace.artifact_path(ArtifactKind::FitCurve, &stem);
    let fit = context
        .workspace
        .read_artifact(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| FitFile::read_from(&mut Cursor::new(text)).map_err(|e| e.to_string()));
    let fit = match fit {
        Ok(fit) => Some(fit),
        Err(error) => {
            warn!(path = %path.display(), %error, "Best-fit curve unavailable.");
            None
        }
    };
    Some(BestFit {
        concentration: curve.concentration,
        kd: record.kd,
        chi_squared,
        fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::binding::ModelKind;
    use crate::engine::config::SweepConfigBuilder;
    use crate::engine::test_support::{
        TargetFitEngine, species_curves, sweep_config, target_mixture, write_experiment,
    };
    use crate::engine::workspace::MemoryWorkspace;
    use approx::assert_relative_eq;
    use tempfile::{TempDir, tempdir};

    const TRUE_KD: f64 = 10.0;

    /// Two datasets on disk and a fit engine that knows their targets.
    struct Fixture {
        _dir: TempDir,
        inputs: SweepInputs,
        engine: TargetFitEngine,
    }

    fn fixture(config: &SweepConfig) -> Fixture {
        let dir = tempdir().unwrap();
        let mut engine = TargetFitEngine::new();
        let mut experiments = Vec::new();
        for (name, concentration) in [("exp_36uM.dat", 36.0), ("exp_72uM.dat", 72.0)] {
            let target = target_mixture(&config.model, concentration, TRUE_KD);
            let path = write_experiment(dir.path(), name, &target);
            engine = engine.with_target(path.clone(), target);
            experiments.push(ExperimentalInput {
                path,
                concentration,
            });
        }
        Fixture {
            _dir: dir,
            inputs: SweepInputs {
                experiments,
                species: species_curves().into_iter().map(|c| vec![c]).collect(),
            },
            engine,
        }
    }

    fn run_with(
        config: &SweepConfig,
        inputs: &SweepInputs,
        engine: &TargetFitEngine,
    ) -> Result<SweepResult, EngineError> {
        let workspace = MemoryWorkspace::new();
        let mut cache = LCurveCache::default();
        run(
            config,
            inputs,
            engine,
            &workspace,
            &mut cache,
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
    }

    #[test]
    fn full_sweep_finds_the_generating_kd_at_every_concentration() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let result = run_with(&config, &fixture.inputs, &fixture.engine).unwrap();

        assert_eq!(result.curves.len(), 2);
        assert_eq!(result.averaged.len(), config.grid.len());
        assert_eq!(result.averaged.best_fit().unwrap().kd, TRUE_KD);
        assert!(result.averaged.points.iter().all(|p| p.samples == 2));

        assert_eq!(result.best_fits.len(), 2);
        for best in &result.best_fits {
            assert_eq!(best.kd, TRUE_KD);
            let fit = best.fit.as_ref().unwrap();
            assert_eq!(fit.len(), species_curves()[0].len());
            for residual in fit.residuals() {
                assert_relative_eq!(residual, 0.0, epsilon = 1e-6);
            }
        }

        assert_eq!(result.per_concentration.len(), 2);
        assert!(result.per_concentration.iter().all(|c| c.analysis.is_some()));
        assert_eq!(result.analysis.valid_points, config.grid.len());
        assert_eq!(result.profile.kd, result.analysis.optimal_kd);
        assert_eq!(result.profile.rows.len(), config.profile.points);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let first = run_with(&config, &fixture.inputs, &fixture.engine).unwrap();
        let second = run_with(&config, &fixture.inputs, &fixture.engine).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_species_profiles_average_to_the_same_result() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let mut doubled = fixture.inputs.clone();
        for profiles in &mut doubled.species {
            let copy = profiles[0].clone();
            profiles.push(copy);
        }
        let single = run_with(&config, &fixture.inputs, &fixture.engine).unwrap();
        let averaged = run_with(&config, &doubled, &fixture.engine).unwrap();
        assert_eq!(
            single.averaged.best_fit().unwrap().kd,
            averaged.averaged.best_fit().unwrap().kd
        );
    }

    #[test]
    fn species_without_profiles_is_missing_input() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let mut inputs = fixture.inputs.clone();
        inputs.species[1].clear();
        let err = run_with(&config, &inputs, &fixture.engine).unwrap_err();
        assert!(matches!(err, EngineError::MissingInput(ref m) if m.contains("oligomer")));
    }

    #[test]
    fn failed_preparation_still_finishes_its_stage() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let mut inputs = fixture.inputs.clone();
        inputs.species[1].clear();
        let events = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        let workspace = MemoryWorkspace::new();
        let mut cache = LCurveCache::default();
        let result = run(
            &config,
            &inputs,
            &fixture.engine,
            &workspace,
            &mut cache,
            &reporter,
            &CancellationToken::new(),
        );
        assert!(result.is_err());
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert!(matches!(events.first(), Some(Progress::StageStart { .. })));
        assert!(matches!(events.last(), Some(Progress::StageFinish)));
    }

    #[test]
    fn sequential_binding_without_receptor_is_missing_input() {
        let err: EngineError = SweepConfigBuilder::new()
            .model_kind(ModelKind::SequentialBinding)
            .stoichiometry(1)
            .kd_range(0.1, 100.0)
            .kd_points(10)
            .build()
            .unwrap_err()
            .into();
        assert!(matches!(err, EngineError::MissingInput(_)));
    }

    #[test]
    fn cancelled_workflow_stops_with_cancelled() {
        let config = sweep_config(21);
        let fixture = fixture(&config);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let workspace = MemoryWorkspace::new();
        let mut cache = LCurveCache::default();
        let err = run(
            &config,
            &fixture.inputs,
            &fixture.engine,
            &workspace,
            &mut cache,
            &ProgressReporter::new(),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { completed: 0, .. }));
        assert!(cache.is_empty());
    }
}
