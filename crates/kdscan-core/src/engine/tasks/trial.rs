use crate::core::equilibrium::{EquilibriumInput, EquilibriumSolver};
use crate::core::io::int::IntFile;
use crate::core::io::traits::CurveFile;
use crate::core::models::chi2::ChiSquaredRecord;
use crate::core::models::curve::ScatteringCurve;
use crate::engine::context::{ExperimentalInput, SweepContext};
use crate::engine::error::EngineError;
use crate::engine::fitter::FitRequest;
use crate::engine::workspace::ArtifactKind;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// The equilibrium was solved; the record's chi-squared is `None` if the fit failed.
    Recorded(ChiSquaredRecord),
    /// No physical equilibrium exists at this Kd; the point is left out.
    Dropped,
    /// The sweep was cancelled before this trial started.
    Skipped,
}

#[instrument(skip_all, fields(concentration = experiment.concentration, kd))]
pub fn run(
    context: &SweepContext,
    experiment: &ExperimentalInput,
    kd: f64,
) -> Result<TrialOutcome, EngineError> {
    if context.cancel.is_cancelled() {
        return Ok(TrialOutcome::Skipped);
    }

    let input = EquilibriumInput {
        concentration: experiment.concentration,
        kd,
    };
    let distribution = match context.config.model.solve(input).into_result() {
        Ok(distribution) => distribution,
        Err(reason) => {
            warn!(%reason, "No physical equilibrium; dropping this Kd.");
            return Ok(TrialOutcome::Dropped);
        }
    };

    let mixture = ScatteringCurve::mix(context.species, &distribution.fractions)
        .map_err(|e| EngineError::InvalidInput(format!("cannot mix species curves: {}", e)))?;

    let stem = context.artifact_stem(experiment.concentration, kd);
    let workspace = context.workspace;
    let theoretical = workspace.artifact_path(ArtifactKind::TheoreticalCurve, &stem);
    let text = IntFile::to_text(&mixture)
        .map_err(|e| EngineError::Internal(format!("cannot render theoretical curve: {}", e)))?;
    workspace.write_artifact(&theoretical, &text)?;

    let request = FitRequest {
        theoretical,
        experimental: experiment.path.clone(),
        fit: workspace.artifact_path(ArtifactKind::FitCurve, &stem),
        log: workspace.artifact_path(ArtifactKind::FitLog, &stem),
        units: context.config.fit_units,
    };
    let chi_squared = match context.fit_engine.fit(&request, workspace) {
        Ok(outcome) => {
            debug!(chi2 = outcome.chi_squared, "Trial fitted.");
            Some(outcome.chi_squared)
        }
        Err(error) => {
            warn!(%error, engine = context.fit_engine.name(), "Fit failed; chi-squared recorded as missing.");
            None
        }
    };

    Ok(TrialOutcome::Recorded(ChiSquaredRecord {
        kd,
        concentration: experiment.concentration,
        fractions: distribution.fractions,
        chi_squared,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cancel::CancellationToken;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::test_support::{TargetFitEngine, species_curves, sweep_config};
    use crate::engine::workspace::{MemoryWorkspace, Workspace};
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn experiment(concentration: f64) -> ExperimentalInput {
        ExperimentalInput {
            path: PathBuf::from("exp.dat"),
            concentration,
        }
    }

    #[test]
    fn trial_writes_the_mixed_curve_and_records_chi_squared() {
        let config = sweep_config(21);
        let species = species_curves();
        let engine = TargetFitEngine::for_experiment(&config.model, "exp.dat", 36.0, 10.0);
        let workspace = MemoryWorkspace::new();
        let reporter = ProgressReporter::new();
        let cancel = CancellationToken::new();
        let context = SweepContext::new(&config, &species, &engine, &workspace, &reporter, &cancel);

        let outcome = run(&context, &experiment(36.0), 10.0).unwrap();
        let TrialOutcome::Recorded(record) = outcome else {
            panic!("expected a recorded trial");
        };
        assert_relative_eq!(record.chi_squared.unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(record.fractions.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

        let text = workspace
            .read_artifact(&PathBuf::from("theoretical_int/theoretical_36.00_10.00.int"))
            .unwrap();
        assert_eq!(text.lines().count(), species[0].len());
    }

    #[test]
    fn trial_without_physical_equilibrium_is_dropped() {
        let config = sweep_config(21);
        let species = species_curves();
        let engine = TargetFitEngine::for_experiment(&config.model, "exp.dat", 36.0, 10.0);
        let workspace = MemoryWorkspace::new();
        let reporter = ProgressReporter::new();
        let cancel = CancellationToken::new();
        let context = SweepContext::new(&config, &species, &engine, &workspace, &reporter, &cancel);

        assert_eq!(run(&context, &experiment(0.0), 10.0).unwrap(), TrialOutcome::Dropped);
        assert!(workspace.paths().is_empty());
    }

    #[test]
    fn cancelled_trial_is_skipped_without_side_effects() {
        let config = sweep_config(21);
        let species = species_curves();
        let engine = TargetFitEngine::for_experiment(&config.model, "exp.dat", 36.0, 10.0);
        let workspace = MemoryWorkspace::new();
        let reporter = ProgressReporter::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let context = SweepContext::new(&config, &species, &engine, &workspace, &reporter, &cancel);

        assert_eq!(run(&context, &experiment(36.0), 10.0).unwrap(), TrialOutcome::Skipped);
        assert!(workspace.paths().is_empty());
    }

    #[test]
    fn failed_fit_keeps_the_point_with_missing_chi_squared() {
        let config = sweep_config(21);
        let species = species_curves();
        let engine = TargetFitEngine::for_experiment(&config.model, "other.dat", 36.0, 10.0);
        let workspace = MemoryWorkspace::new();
        let reporter = ProgressReporter::new();
        let cancel = CancellationToken::new();
        let context = SweepContext::new(&config, &species, &engine, &workspace, &reporter, &cancel);

        let TrialOutcome::Recorded(record) = run(&context, &experiment(36.0), 10.0).unwrap() else {
            panic!("expected a recorded trial");
        };
        assert_eq!(record.chi_squared, None);
        assert_eq!(record.fractions.len(), 2);
    }
}
