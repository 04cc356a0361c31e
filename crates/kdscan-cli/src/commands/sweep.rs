use super::{export_csv, export_lcurve, print_analysis};
use crate::cli::SweepArgs;
use crate::config::builder::build_config;
use crate::config::models::{AppConfig, SpeciesFiles};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use kdscan::core::analysis::LCurveAnalyzer;
use kdscan::core::io::{int::IntFile, table, traits::CurveFile};
use kdscan::core::models::curve::ScatteringCurve;
use kdscan::engine::cache::LCurveCache;
use kdscan::engine::cancel::CancellationToken;
use kdscan::engine::error::EngineError;
use kdscan::engine::fitter::OligomerFitEngine;
use kdscan::engine::progress::ProgressReporter;
use kdscan::engine::workspace::DirectoryWorkspace;
use kdscan::workflows::sweep::{self, SweepInputs, SweepResult};
use tracing::{info, warn};

pub fn run(args: SweepArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_config(&args)?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    println!(
        "Sweeping {} Kd values over {} concentration(s) with {}...",
        app_config.core_config.grid.len(),
        app_config.experiments.len(),
        app_config.fit_engine.executable.display()
    );
    let result = execute(&app_config, &cancel, quiet)?;

    export_results(&app_config, &result)?;
    print_summary(&app_config, &result);
    Ok(())
}

/// Stops scheduling new Kd trials on Ctrl-C. Trials already running finish.
fn cancel_on_interrupt(cancel: &CancellationToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        warn!("Interrupt received; cancelling the remaining Kd trials.");
        token.cancel();
    });
    if let Err(error) = installed {
        warn!(%error, "Cannot install the interrupt handler.");
    }
}

fn execute(
    app_config: &AppConfig,
    cancel: &CancellationToken,
    quiet: bool,
) -> Result<SweepResult> {
    info!(
        species = app_config.species.len(),
        experiments = app_config.experiments.len(),
        "Loading theoretical profiles..."
    );
    let species = load_species(&app_config.species)?;

    let workspace =
        DirectoryWorkspace::create(&app_config.output_dir).map_err(EngineError::from)?;
    let fit_engine = OligomerFitEngine::new(
        &app_config.fit_engine.executable,
        app_config.fit_engine.timeout,
    );

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut cache = LCurveCache::new(LCurveAnalyzer::new(
        app_config.core_config.analysis.clone(),
    ));

    let inputs = SweepInputs {
        experiments: app_config.experiments.clone(),
        species,
    };
    let result = sweep::run(
        &app_config.core_config,
        &inputs,
        &fit_engine,
        &workspace,
        &mut cache,
        &reporter,
        cancel,
    )?;
    Ok(result)
}

fn load_species(species: &[SpeciesFiles]) -> Result<Vec<Vec<ScatteringCurve>>> {
    species
        .iter()
        .map(|s| {
            s.files
                .iter()
                .map(|path| {
                    info!(species = %s.label, path = %path.display(), "Reading profile.");
                    IntFile::read_from_path(path).map_err(|e| CliError::FileParsing {
                        path: path.clone(),
                        source: e.into(),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn export_results(app_config: &AppConfig, result: &SweepResult) -> Result<()> {
    let config = &app_config.core_config;
    let dir = &app_config.output_dir;

    for curve in &result.curves {
        let name = format!("chi2_{}.csv", config.format_concentration(curve.concentration));
        export_csv(&dir.join(name), |w| table::write_chi_squared_table(curve, w))?;
    }
    export_csv(&dir.join("chi2_average.csv"), |w| {
        table::write_averaged_table(&result.averaged, w)
    })?;
    export_lcurve(&dir.join("lcurve.csv"), &result.analysis)?;
    export_csv(&dir.join("fractions.csv"), |w| {
        table::write_fraction_profile(&result.profile, w)
    })?;

    for best in &result.best_fits {
        let Some(fit) = &best.fit else {
            warn!(
                concentration = best.concentration,
                kd = best.kd,
                "No fit curve to export for best fit."
            );
            continue;
        };
        let name = format!(
            "best_fit_{}.csv",
            config.format_concentration(best.concentration)
        );
        export_csv(&dir.join(name), |w| table::write_fit_comparison(fit, w))?;
    }
    Ok(())
}

fn print_summary(app_config: &AppConfig, result: &SweepResult) {
    println!();
    println!("Model: {}", app_config.core_config.model);
    for curve in &result.curves {
        let best = curve
            .best_fit()
            .and_then(|r| r.chi_squared.map(|chi2| (r.kd, chi2)));
        match best {
            Some((kd, chi2)) => println!(
                "  c = {}: {}/{} Kd values scored, best Kd {} (chi2 {:.4})",
                app_config.core_config.format_concentration(curve.concentration),
                curve.valid_points(),
                curve.requested_points,
                app_config.core_config.grid.format_kd(kd),
                chi2
            ),
            None => println!(
                "  c = {}: no Kd value scored",
                app_config.core_config.format_concentration(curve.concentration)
            ),
        }
    }
    println!();
    print_analysis(&result.analysis);
    let missing = result.profile.missing_rows();
    if missing > 0 {
        println!(
            "  {} concentration(s) of the fraction profile have no physical solution.",
            missing
        );
    }
    println!("Results written to: {}", app_config.output_dir.display());
}
