use kdscan::engine::config::SweepConfig;
use kdscan::engine::context::ExperimentalInput;
use std::path::PathBuf;
use std::time::Duration;

/// Theoretical profile files of one species, in the model's species order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesFiles {
    pub label: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitEngineSettings {
    pub executable: PathBuf,
    pub timeout: Option<Duration>,
}

pub struct AppConfig {
    pub output_dir: PathBuf,
    pub experiments: Vec<ExperimentalInput>,
    pub species: Vec<SpeciesFiles>,
    pub fit_engine: FitEngineSettings,
    pub core_config: SweepConfig,
}
