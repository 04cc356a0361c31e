use super::trial::{self, TrialOutcome};
use crate::core::io::dat::DatFile;
use crate::core::io::traits::CurveFile;
use crate::core::models::chi2::ChiSquaredCurve;
use crate::core::models::curve::ScatteringCurve;
use crate::engine::context::{ExperimentalInput, SweepContext};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, SweepTally, TrialStatus};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type TrialResult = Result<TrialOutcome, EngineError>;

/// Checks everything a sweep needs before any trial runs.
///
/// # Errors
///
/// - [`EngineError::MissingInput`] without experimental data or with an
///   absent concentration
/// - [`EngineError::InvalidInput`] when the species curves do not match the
///   model or do not share one abscissa, a concentration is not positive, or
///   an experimental file is not a readable three-column dataset
/// - [`EngineError::ExternalToolUnavailable`] when the fit engine cannot be
///   invoked
pub fn check_preconditions(
    context: &SweepContext,
    experiments: &[ExperimentalInput],
) -> Result<(), EngineError> {
    if experiments.is_empty() {
        return Err(EngineError::MissingInput(
            "at least one experimental dataset".to_string(),
        ));
    }
    for experiment in experiments {
        let concentration = experiment.concentration;
        if !concentration.is_finite() {
            return Err(EngineError::MissingInput(format!(
                "concentration for '{}'",
                experiment.path.display()
            )));
        }
        if concentration <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "concentration for '{}' must be positive (got {})",
                experiment.path.display(),
                concentration
            )));
        }
    }

    let model = &context.config.model;
    let expected = model.species_count();
    if context.species.len() != expected {
        return Err(EngineError::InvalidInput(format!(
            "{} needs {} species curves ({}), got {}",
            model,
            expected,
            model.species_labels().join(", "),
            context.species.len()
        )));
    }
    ScatteringCurve::ensure_common_abscissa(context.species)
        .map_err(|e| EngineError::InvalidInput(format!("species curves: {}", e)))?;

    context
        .fit_engine
        .check_available()
        .map_err(|e| EngineError::ExternalToolUnavailable {
            tool: context.fit_engine.name().to_string(),
            reason: e.to_string(),
        })?;

    for experiment in experiments {
        let data = DatFile::read_from_path(&experiment.path).map_err(|e| {
            EngineError::InvalidInput(format!(
                "experimental data '{}': {}",
                experiment.path.display(),
                e
            ))
        })?;
        debug!(
            path = %experiment.path.display(),
            points = data.curve.len(),
            "Experimental data parsed."
        );
    }
    Ok(())
}

/// Sweeps the Kd grid at one experimental concentration.
///
/// Trials run concurrently; results are gathered in grid order once all of
/// them have finished. Points without a physical equilibrium are left out and
/// failed fits are kept with a missing chi-squared.
///
/// # Errors
///
/// Returns the first hard trial error, [`EngineError::Cancelled`] if the
/// sweep was cancelled and [`EngineError::GridExhausted`] if no trial
/// produced a chi-squared value.
#[instrument(skip_all, name = "kd_sweep_task", fields(concentration = experiment.concentration))]
pub fn run(
    context: &SweepContext,
    experiment: &ExperimentalInput,
) -> Result<ChiSquaredCurve, EngineError> {
    let grid = &context.config.grid;
    let total = grid.len();
    let label = format!(
        "c = {}",
        context.config.format_concentration(experiment.concentration)
    );
    info!(points = total, "Starting Kd sweep.");
    context.reporter.report(Progress::SweepStart {
        label: label.clone(),
        trials: total as u64,
    });

    let outcomes = execute(context, experiment);
    let tally: SweepTally = match &outcomes {
        Ok(results) => results.iter().map(status_of).collect(),
        Err(_) => SweepTally::default(),
    };
    context.reporter.report(Progress::SweepFinish { label, tally });

    let mut curve = ChiSquaredCurve::new(
        experiment.concentration,
        context.config.model.species_labels(),
        grid.requested(),
    );
    for outcome in outcomes? {
        if let TrialOutcome::Recorded(record) = outcome? {
            curve.records.push(record);
        }
    }

    if tally.skipped > 0 {
        warn!(completed = tally.completed(), total, "Kd sweep cancelled.");
        return Err(EngineError::Cancelled {
            completed: tally.completed(),
            total,
        });
    }

    let succeeded = curve.valid_points();
    if succeeded == 0 {
        return Err(EngineError::GridExhausted {
            concentration: experiment.concentration,
            attempted: total,
            succeeded,
        });
    }

    info!(
        valid = succeeded,
        requested = grid.requested(),
        dropped = tally.dropped,
        fit_failed = tally.fit_failed,
        "Kd sweep finished."
    );
    Ok(curve)
}

fn status_of(result: &TrialResult) -> TrialStatus {
    match result {
        Ok(TrialOutcome::Recorded(record)) if record.chi_squared.is_some() => TrialStatus::Scored,
        Ok(TrialOutcome::Recorded(_)) => TrialStatus::FitFailed,
        Ok(TrialOutcome::Dropped) => TrialStatus::Dropped,
        Ok(TrialOutcome::Skipped) => TrialStatus::Skipped,
        Err(_) => TrialStatus::Errored,
    }
}

fn execute(
    context: &SweepContext,
    experiment: &ExperimentalInput,
) -> Result<Vec<TrialResult>, EngineError> {
    let values = context.config.grid.values();
    let evaluate = |kd: &f64| -> TrialResult {
        let outcome = trial::run(context, experiment, *kd);
        context
            .reporter
            .report(Progress::TrialFinished(status_of(&outcome)));
        outcome
    };

    #[cfg(not(feature = "parallel"))]
    let results = values.iter().map(evaluate).collect();

    #[cfg(feature = "parallel")]
    let results = match context.config.max_workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| EngineError::Internal(format!("cannot start worker pool: {}", e)))?;
            pool.install(|| values.par_iter().map(evaluate).collect())
        }
        None => values.par_iter().map(evaluate).collect(),
    };

    Ok(results)
}
