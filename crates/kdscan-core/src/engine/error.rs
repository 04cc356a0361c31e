use thiserror::Error;

use super::config::ConfigError;
use super::fitter::FitEngineError;
use super::workspace::WorkspaceError;
use crate::core::analysis::AnalysisError;
use crate::core::models::binding::ModelError;
use crate::core::models::species::InvalidEquilibrium;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No physical equilibrium: {0}")]
    InvalidEquilibrium(#[from] InvalidEquilibrium),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fit engine '{tool}' is unavailable: {reason}")]
    ExternalToolUnavailable { tool: String, reason: String },

    #[error("Fit engine failed: {0}")]
    ExternalToolFailure(#[from] FitEngineError),

    #[error(
        "No usable Kd points at concentration {concentration}: {succeeded} of {attempted} trials produced a chi-squared value"
    )]
    GridExhausted {
        concentration: f64,
        attempted: usize,
        succeeded: usize,
    },

    #[error("Sweep cancelled after {completed} of {total} trials")]
    Cancelled { completed: usize, total: usize },

    #[error("Configuration error: {0}")]
    Config(ConfigError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("L-curve analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<ModelError> for EngineError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::MissingReceptorConcentration => {
                EngineError::MissingInput("receptor concentration".to_string())
            }
            other => EngineError::InvalidInput(other.to_string()),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Model(model) => model.into(),
            other => EngineError::Config(other),
        }
    }
}
