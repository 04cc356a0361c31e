use super::export_csv;
use crate::cli::ProfileArgs;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use kdscan::core::equilibrium::profile::{self, ConcentrationRange, FractionProfile, Spacing};
use kdscan::core::io::table;
use kdscan::core::models::binding::{BindingModel, ModelKind};
use kdscan::engine::error::EngineError;
use std::str::FromStr;
use tracing::info;

pub fn run(args: ProfileArgs) -> Result<()> {
    let fraction_profile = compute(&args)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    export_csv(&args.output, |w| {
        table::write_fraction_profile(&fraction_profile, w)
    })?;

    println!(
        "Fraction profile at Kd = {} over {} concentration(s) written to: {}",
        args.kd,
        fraction_profile.rows.len(),
        args.output.display()
    );
    let missing = fraction_profile.missing_rows();
    if missing > 0 {
        println!(
            "  {} concentration(s) have no physical solution and were left blank.",
            missing
        );
    }
    Ok(())
}

fn compute(args: &ProfileArgs) -> Result<FractionProfile> {
    if !(args.kd.is_finite() && args.kd > 0.0) {
        return Err(CliError::Argument(format!(
            "Kd must be positive and finite (got {})",
            args.kd
        )));
    }

    let kind = ModelKind::from_str(&args.model).map_err(|e| CliError::Argument(e.to_string()))?;
    let model = BindingModel::from_parts(kind, args.stoichiometry, args.receptor)
        .map_err(EngineError::from)?;

    let defaults = DefaultsConfig::default();
    let range = ConcentrationRange {
        min: args.conc_min.unwrap_or(defaults.profile_min),
        max: args.conc_max.unwrap_or(defaults.profile_max),
        points: args.points.unwrap_or(defaults.profile_points),
        spacing: if args.linear {
            Spacing::Linear
        } else {
            Spacing::Logarithmic
        },
    };
    let concentrations = range
        .grid()
        .map_err(|e| CliError::Argument(format!("Invalid concentration range: {}", e)))?;

    info!(model = %model, kd = args.kd, points = concentrations.len(), "Generating fraction profile.");
    Ok(profile::generate(&model, args.kd, &concentrations))
}
