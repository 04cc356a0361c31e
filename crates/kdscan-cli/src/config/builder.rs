use super::defaults::DefaultsConfig;
use super::file::{FileAnalysisConfig, FileConfig, FileProfileConfig, FileSpacing};
use super::models::{AppConfig, FitEngineSettings, SpeciesFiles};
use crate::cli::SweepArgs;
use crate::error::{CliError, Result};
use kdscan::core::analysis::LCurveConfig;
use kdscan::core::equilibrium::profile::{ConcentrationRange, Spacing};
use kdscan::core::models::binding::ModelKind;
use kdscan::engine::config::SweepConfigBuilder;
use kdscan::engine::context::ExperimentalInput;
use kdscan::engine::error::EngineError;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub fn build_config(args: &SweepArgs) -> Result<AppConfig> {
    let file_config = FileConfig::from_file(&args.config)?;
    let file_config = apply_set_values(file_config, &args.set_values)?;
    merge(args, file_config)
}

fn merge(args: &SweepArgs, mut file_config: FileConfig) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let model_file = file_config.model.take().unwrap_or_default();
    let kind_text = args
        .model
        .clone()
        .or(model_file.kind)
        .unwrap_or_else(|| defaults.model_kind.clone());
    let kind = ModelKind::from_str(&kind_text).map_err(|e| CliError::Config(e.to_string()))?;
    let stoichiometry = args
        .stoichiometry
        .or(model_file.stoichiometry)
        .ok_or_else(|| {
            CliError::Config(
                "`model.stoichiometry` is required in the config file or via --stoichiometry."
                    .to_string(),
            )
        })?;
    let receptor = args.receptor.or(model_file.receptor_concentration);

    let sweep_file = file_config.sweep.take().unwrap_or_default();
    let kd_min = args.kd_min.or(sweep_file.kd_min).unwrap_or(defaults.kd_min);
    let kd_max = args.kd_max.or(sweep_file.kd_max).unwrap_or(defaults.kd_max);
    let kd_points = args
        .kd_points
        .or(sweep_file.kd_points)
        .unwrap_or(defaults.kd_points);

    let engine_file = file_config.fit_engine.take().unwrap_or_default();
    let executable = args
        .fit_engine
        .clone()
        .or(engine_file.executable)
        .unwrap_or_else(|| defaults.fit_engine.clone());
    let timeout_secs = args
        .timeout
        .or(engine_file.timeout_secs)
        .unwrap_or(defaults.fit_timeout_secs);
    let max_workers = args.max_workers.or(engine_file.max_workers);

    let analysis = merge_analysis(file_config.analysis.take());
    let profile = merge_profile(file_config.profile.take(), &defaults);

    let core_config = SweepConfigBuilder::new()
        .model_kind(kind)
        .stoichiometry(stoichiometry)
        .receptor_concentration(receptor)
        .kd_range(kd_min, kd_max)
        .kd_points(kd_points)
        .kd_decimals(sweep_file.kd_decimals.unwrap_or(defaults.kd_decimals))
        .concentration_decimals(
            sweep_file
                .concentration_decimals
                .unwrap_or(defaults.concentration_decimals),
        )
        .fit_units(engine_file.units)
        .max_workers(max_workers)
        .analysis(analysis)
        .profile(profile)
        .build()
        .map_err(EngineError::from)?;

    let experiments = file_config
        .experimental
        .iter()
        .map(|e| ExperimentalInput {
            path: file_config.resolve(&e.file),
            concentration: e.concentration,
        })
        .collect();

    let labels = core_config.model.species_labels();
    let species = file_config
        .species
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let label = labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("species_{}", index));
            if let Some(name) = s.name.as_deref().filter(|name| *name != label) {
                warn!(
                    index,
                    configured = name,
                    expected = %label,
                    "Species are matched by position; the configured name differs from the model's."
                );
            }
            SpeciesFiles {
                label,
                files: s.files.iter().map(|f| file_config.resolve(f)).collect(),
            }
        })
        .collect();

    let output_dir = args
        .output
        .clone()
        .or(file_config.output_dir.take())
        .unwrap_or(defaults.output_dir);

    Ok(AppConfig {
        output_dir,
        experiments,
        species,
        fit_engine: FitEngineSettings {
            executable,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        },
        core_config,
    })
}

fn merge_analysis(file_val: Option<FileAnalysisConfig>) -> LCurveConfig {
    let file_val = file_val.unwrap_or_default();
    let base = LCurveConfig::default();
    LCurveConfig {
        resample_points: file_val.resample_points.unwrap_or(base.resample_points),
        derivative_window: file_val
            .derivative_window
            .unwrap_or(base.derivative_window),
        curvature_window: file_val.curvature_window.unwrap_or(base.curvature_window),
        polyorder: file_val.polyorder.unwrap_or(base.polyorder),
        changepoint_max_window: file_val
            .changepoint_window
            .unwrap_or(base.changepoint_max_window),
        max_change_points: file_val
            .max_change_points
            .unwrap_or(base.max_change_points),
        threshold_sigmas: file_val.threshold_sigmas.unwrap_or(base.threshold_sigmas),
        min_valid_points: file_val.min_valid_points.unwrap_or(base.min_valid_points),
        ..base
    }
}

fn merge_profile(
    file_val: Option<FileProfileConfig>,
    defaults: &DefaultsConfig,
) -> ConcentrationRange {
    let file_val = file_val.unwrap_or_default();
    ConcentrationRange {
        min: file_val.conc_min.unwrap_or(defaults.profile_min),
        max: file_val.conc_max.unwrap_or(defaults.profile_max),
        points: file_val.points.unwrap_or(defaults.profile_points),
        spacing: file_val.spacing.map(Spacing::from).unwrap_or_default(),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "output-dir" => config.output_dir = Some(value.into()),
            "model.kind" => {
                config.model.get_or_insert_with(Default::default).kind = Some(value.to_string())
            }
            "model.stoichiometry" => {
                config.model.get_or_insert_with(Default::default).stoichiometry =
                    Some(parse_value(key, value)?)
            }
            "model.receptor-concentration" => {
                config
                    .model
                    .get_or_insert_with(Default::default)
                    .receptor_concentration = Some(parse_value(key, value)?)
            }
            "sweep.kd-min" => {
                config.sweep.get_or_insert_with(Default::default).kd_min =
                    Some(parse_value(key, value)?)
            }
            "sweep.kd-max" => {
                config.sweep.get_or_insert_with(Default::default).kd_max =
                    Some(parse_value(key, value)?)
            }
            "sweep.kd-points" => {
                config.sweep.get_or_insert_with(Default::default).kd_points =
                    Some(parse_value(key, value)?)
            }
            "sweep.kd-decimals" => {
                config.sweep.get_or_insert_with(Default::default).kd_decimals =
                    Some(parse_value(key, value)?)
            }
            "sweep.concentration-decimals" => {
                config
                    .sweep
                    .get_or_insert_with(Default::default)
                    .concentration_decimals = Some(parse_value(key, value)?)
            }
            "fit-engine.executable" => {
                config.fit_engine.get_or_insert_with(Default::default).executable =
                    Some(value.into())
            }
            "fit-engine.timeout-secs" => {
                config.fit_engine.get_or_insert_with(Default::default).timeout_secs =
                    Some(parse_value(key, value)?)
            }
            "fit-engine.units" => {
                config.fit_engine.get_or_insert_with(Default::default).units =
                    Some(parse_value(key, value)?)
            }
            "fit-engine.max-workers" => {
                config.fit_engine.get_or_insert_with(Default::default).max_workers =
                    Some(parse_value(key, value)?)
            }
            "analysis.resample-points" => {
                config
                    .analysis
                    .get_or_insert_with(Default::default)
                    .resample_points = Some(parse_value(key, value)?)
            }
            "analysis.min-valid-points" => {
                config
                    .analysis
                    .get_or_insert_with(Default::default)
                    .min_valid_points = Some(parse_value(key, value)?)
            }
            "analysis.threshold-sigmas" => {
                config
                    .analysis
                    .get_or_insert_with(Default::default)
                    .threshold_sigmas = Some(parse_value(key, value)?)
            }
            "profile.conc-min" => {
                config.profile.get_or_insert_with(Default::default).conc_min =
                    Some(parse_value(key, value)?)
            }
            "profile.conc-max" => {
                config.profile.get_or_insert_with(Default::default).conc_max =
                    Some(parse_value(key, value)?)
            }
            "profile.points" => {
                config.profile.get_or_insert_with(Default::default).points =
                    Some(parse_value(key, value)?)
            }
            "profile.spacing" => {
                let spacing = match value {
                    "log" | "logarithmic" => FileSpacing::Log,
                    "linear" => FileSpacing::Linear,
                    other => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: '{}'. Expected 'log' or 'linear'.",
                            key, other
                        )));
                    }
                };
                config.profile.get_or_insert_with(Default::default).spacing = Some(spacing)
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use kdscan::core::models::binding::BindingModel;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    const BASE_CONFIG: &str = r#"
[model]
kind = "monomer-oligomer"
stoichiometry = 2

[sweep]
kd-min = 0.1
kd-max = 1000.0
kd-points = 21

[[experimental]]
file = "exp_36uM.dat"
concentration = 36.0

[[species]]
name = "monomer"
files = ["monomer.int"]

[[species]]
name = "oligomer"
files = ["dimer_a.int", "dimer_b.int"]
"#;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn sweep_args(config: &Path, extra: &[&str]) -> SweepArgs {
        let mut argv = vec![
            "kdscan".to_string(),
            "sweep".to_string(),
            "-c".to_string(),
            config.to_str().unwrap().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(argv).command {
            Commands::Sweep(args) => args,
            other => panic!("expected sweep, got {other:?}"),
        }
    }

    #[test]
    fn file_values_are_merged_with_defaults() {
        let (dir, path) = write_config(BASE_CONFIG);
        let config = build_config(&sweep_args(&path, &[])).unwrap();

        assert_eq!(
            config.core_config.model,
            BindingModel::MonomerOligomer { n: 2 }
        );
        assert_eq!(config.core_config.grid.len(), 21);
        assert_eq!(config.core_config.grid.decimals(), 2);
        assert_eq!(config.core_config.fit_units, 2);
        assert_eq!(config.fit_engine.executable, PathBuf::from("oligomer"));
        assert_eq!(config.fit_engine.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.output_dir, PathBuf::from("kdscan_results"));
        assert_eq!(config.experiments[0].path, dir.path().join("exp_36uM.dat"));
        assert_eq!(config.experiments[0].concentration, 36.0);
        assert_eq!(config.species[1].label, "oligomer");
        assert_eq!(config.species[1].files.len(), 2);
        assert_eq!(config.core_config.profile.points, 50);
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let (_dir, path) = write_config(BASE_CONFIG);
        let args = sweep_args(
            &path,
            &["-n", "3", "--kd-points", "11", "-o", "out", "--timeout", "0"],
        );
        let config = build_config(&args).unwrap();

        assert_eq!(config.core_config.model.stoichiometry(), 3);
        assert_eq!(config.core_config.grid.len(), 11);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.fit_engine.timeout, None);
    }

    #[test]
    fn set_values_override_file_values() {
        let (_dir, path) = write_config(BASE_CONFIG);
        let args = sweep_args(
            &path,
            &[
                "-S",
                "sweep.kd-decimals=3",
                "-S",
                "profile.spacing=linear",
                "-S",
                "fit-engine.units=1",
            ],
        );
        let config = build_config(&args).unwrap();

        assert_eq!(config.core_config.grid.decimals(), 3);
        assert_eq!(config.core_config.profile.spacing, Spacing::Linear);
        assert_eq!(config.core_config.fit_units, 1);
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let (_dir, path) = write_config(BASE_CONFIG);
        for bad in ["sweep.kd-points", "sweep.kd-points=many", "sweep.unknown=1"] {
            let result = build_config(&sweep_args(&path, &["-S", bad]));
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn missing_stoichiometry_is_a_config_error() {
        let (_dir, path) = write_config("[model]\nkind = \"monomer-oligomer\"\n");
        let result = build_config(&sweep_args(&path, &[]));
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("stoichiometry")),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn sequential_binding_without_receptor_is_missing_input() {
        let (_dir, path) = write_config(
            "[model]\nkind = \"sequential-binding\"\nstoichiometry = 1\n",
        );
        let result = build_config(&sweep_args(&path, &[]));
        assert!(matches!(
            result,
            Err(CliError::Core(EngineError::MissingInput(_)))
        ));
    }

    #[test]
    fn sequential_binding_labels_follow_the_model() {
        let (_dir, path) = write_config(
            r#"
[model]
kind = "sequential-binding"
stoichiometry = 1
receptor-concentration = 10.0

[[species]]
files = ["r0.int"]
[[species]]
files = ["r1.int"]
[[species]]
files = ["ligand.int"]
"#,
        );
        let config = build_config(&sweep_args(&path, &[])).unwrap();
        let labels: Vec<&str> = config.species.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["receptor_0", "receptor_1", "ligand_free"]);
        assert_eq!(config.core_config.fit_units, 1);
    }
}
