use std::path::PathBuf;

pub struct DefaultsConfig {
    pub model_kind: String,
    pub kd_min: f64,
    pub kd_max: f64,
    pub kd_points: usize,
    pub kd_decimals: u32,
    pub concentration_decimals: u32,
    pub fit_engine: PathBuf,
    pub fit_timeout_secs: u64,
    pub profile_min: f64,
    pub profile_max: f64,
    pub profile_points: usize,
    pub output_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model_kind: "monomer-oligomer".to_string(),
            kd_min: 1e-4,
            kd_max: 1e4,
            kd_points: 40,
            kd_decimals: 2,
            concentration_decimals: 2,
            fit_engine: PathBuf::from("oligomer"),
            fit_timeout_secs: 300,
            profile_min: 1.0,
            profile_max: 1000.0,
            profile_points: 50,
            output_dir: PathBuf::from("kdscan_results"),
        }
    }
}
