use crate::core::analysis::LCurveConfig;
use crate::core::equilibrium::profile::{ConcentrationRange, Spacing};
use crate::core::grid::{GridError, KdGrid};
use crate::core::models::binding::{BindingModel, ModelError, ModelKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter: {0}")]
    Invalid(String),
    #[error("Invalid binding model: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid Kd grid: {0}")]
    Grid(#[from] GridError),
}

/// Everything a multi-concentration Kd sweep needs besides its input curves.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub model: BindingModel,
    pub grid: KdGrid,
    /// Decimals used when a concentration appears in an artifact name.
    pub concentration_decimals: u32,
    /// Intensity-unit flag handed to the fit engine.
    pub fit_units: u8,
    /// Upper bound on concurrently running trials; `None` uses the global pool.
    pub max_workers: Option<usize>,
    pub analysis: LCurveConfig,
    pub profile: ConcentrationRange,
}

impl SweepConfig {
    pub fn format_concentration(&self, concentration: f64) -> String {
        format!("{:.*}", self.concentration_decimals as usize, concentration)
    }
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    model_kind: Option<ModelKind>,
    stoichiometry: Option<u32>,
    receptor_concentration: Option<f64>,
    kd_min: Option<f64>,
    kd_max: Option<f64>,
    kd_points: Option<usize>,
    kd_decimals: Option<u32>,
    concentration_decimals: Option<u32>,
    fit_units: Option<u8>,
    max_workers: Option<usize>,
    analysis: Option<LCurveConfig>,
    profile: Option<ConcentrationRange>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = Some(kind);
        self
    }
    pub fn stoichiometry(mut self, n: u32) -> Self {
        self.stoichiometry = Some(n);
        self
    }
    pub fn receptor_concentration(mut self, concentration: Option<f64>) -> Self {
        self.receptor_concentration = concentration;
        self
    }
    pub fn kd_range(mut self, min: f64, max: f64) -> Self {
        self.kd_min = Some(min);
        self.kd_max = Some(max);
        self
    }
    pub fn kd_points(mut self, points: usize) -> Self {
        self.kd_points = Some(points);
        self
    }
    pub fn kd_decimals(mut self, decimals: u32) -> Self {
        self.kd_decimals = Some(decimals);
        self
    }
    pub fn concentration_decimals(mut self, decimals: u32) -> Self {
        self.concentration_decimals = Some(decimals);
        self
    }
    pub fn fit_units(mut self, units: Option<u8>) -> Self {
        self.fit_units = units;
        self
    }
    pub fn max_workers(mut self, workers: Option<usize>) -> Self {
        self.max_workers = workers;
        self
    }
    pub fn analysis(mut self, config: LCurveConfig) -> Self {
        self.analysis = Some(config);
        self
    }
    pub fn profile(mut self, range: ConcentrationRange) -> Self {
        self.profile = Some(range);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let kind = self
            .model_kind
            .ok_or(ConfigError::MissingParameter("model_kind"))?;
        let n = self
            .stoichiometry
            .ok_or(ConfigError::MissingParameter("stoichiometry"))?;
        let model = BindingModel::from_parts(kind, n, self.receptor_concentration)?;

        let kd_min = self.kd_min.ok_or(ConfigError::MissingParameter("kd_min"))?;
        let kd_max = self.kd_max.ok_or(ConfigError::MissingParameter("kd_max"))?;
        let kd_points = self
            .kd_points
            .ok_or(ConfigError::MissingParameter("kd_points"))?;
        let grid = KdGrid::log_spaced(kd_min, kd_max, kd_points, self.kd_decimals.unwrap_or(2))?;

        if self.max_workers == Some(0) {
            return Err(ConfigError::Invalid(
                "max_workers must be at least 1".to_string(),
            ));
        }

        let profile = self.profile.unwrap_or(ConcentrationRange {
            min: 1.0,
            max: 1000.0,
            points: 50,
            spacing: Spacing::Logarithmic,
        });
        profile.grid()?;

        let analysis = self.analysis.unwrap_or_default();
        if analysis.resample_points < 2 {
            return Err(ConfigError::Invalid(
                "L-curve resampling needs at least 2 points".to_string(),
            ));
        }

        Ok(SweepConfig {
            fit_units: self.fit_units.unwrap_or_else(|| model.default_fit_units()),
            model,
            grid,
            concentration_decimals: self.concentration_decimals.unwrap_or(2),
            max_workers: self.max_workers,
            analysis,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SweepConfigBuilder {
        SweepConfigBuilder::new()
            .model_kind(ModelKind::MonomerOligomer)
            .stoichiometry(2)
            .kd_range(0.1, 1000.0)
            .kd_points(20)
    }

    #[test]
    fn builder_fills_defaults() {
        let config = base().build().unwrap();
        assert_eq!(config.fit_units, 2);
        assert_eq!(config.concentration_decimals, 2);
        assert_eq!(config.grid.decimals(), 2);
        assert_eq!(config.grid.requested(), 20);
        assert_eq!(config.analysis, LCurveConfig::default());
        assert_eq!(config.profile.points, 50);
        assert_eq!(config.format_concentration(36.0), "36.00");
    }

    #[test]
    fn missing_kd_points_is_reported() {
        let result = SweepConfigBuilder::new()
            .model_kind(ModelKind::MonomerOligomer)
            .stoichiometry(2)
            .kd_range(0.1, 10.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("kd_points")));
    }

    #[test]
    fn sequential_binding_without_receptor_is_a_model_error() {
        let result = base().model_kind(ModelKind::SequentialBinding).build();
        assert_eq!(
            result,
            Err(ConfigError::Model(ModelError::MissingReceptorConcentration))
        );
    }

    #[test]
    fn sequential_binding_defaults_to_unit_flag_one() {
        let config = base()
            .model_kind(ModelKind::SequentialBinding)
            .receptor_concentration(Some(20.0))
            .build()
            .unwrap();
        assert_eq!(config.fit_units, 1);
    }

    #[test]
    fn inverted_kd_range_is_rejected() {
        let result = base().kd_range(100.0, 1.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::Grid(GridError::InvalidRange { .. }))
        ));
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            base().max_workers(Some(0)).build(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
