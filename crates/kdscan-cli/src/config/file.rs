use crate::error::{CliError, Result};
use kdscan::core::equilibrium::profile::Spacing;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileModelConfig {
    pub kind: Option<String>,
    pub stoichiometry: Option<u32>,
    pub receptor_concentration: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSweepConfig {
    pub kd_min: Option<f64>,
    pub kd_max: Option<f64>,
    pub kd_points: Option<usize>,
    pub kd_decimals: Option<u32>,
    pub concentration_decimals: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileFitEngineConfig {
    pub executable: Option<PathBuf>,
    /// `0` disables the timeout.
    pub timeout_secs: Option<u64>,
    pub units: Option<u8>,
    pub max_workers: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnalysisConfig {
    pub resample_points: Option<usize>,
    pub derivative_window: Option<usize>,
    pub curvature_window: Option<usize>,
    pub polyorder: Option<usize>,
    pub changepoint_window: Option<usize>,
    pub max_change_points: Option<usize>,
    pub threshold_sigmas: Option<f64>,
    pub min_valid_points: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileSpacing {
    #[serde(alias = "logarithmic")]
    Log,
    Linear,
}

impl From<FileSpacing> for Spacing {
    fn from(spacing: FileSpacing) -> Self {
        match spacing {
            FileSpacing::Log => Spacing::Logarithmic,
            FileSpacing::Linear => Spacing::Linear,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileProfileConfig {
    pub conc_min: Option<f64>,
    pub conc_max: Option<f64>,
    pub points: Option<usize>,
    pub spacing: Option<FileSpacing>,
}

/// One experimental dataset and the concentration it was measured at.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileExperimental {
    pub file: PathBuf,
    pub concentration: f64,
}

/// Theoretical profiles of one species; several files are averaged.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSpecies {
    pub name: Option<String>,
    pub files: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub model: Option<FileModelConfig>,
    pub sweep: Option<FileSweepConfig>,
    pub fit_engine: Option<FileFitEngineConfig>,
    pub analysis: Option<FileAnalysisConfig>,
    pub profile: Option<FileProfileConfig>,
    #[serde(default)]
    pub experimental: Vec<FileExperimental>,
    #[serde(default)]
    pub species: Vec<FileSpecies>,
    /// Directory relative data paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: FileConfig =
            toml::from_str(&content).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
