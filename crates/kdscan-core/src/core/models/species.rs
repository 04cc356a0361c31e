use thiserror::Error;

/// Why an equilibrium solve produced no physical state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidEquilibrium {
    #[error("total concentration must be positive and finite (got {0})")]
    NonPositiveTotal(f64),
    #[error("dissociation constant must be positive and finite (got {0})")]
    NonPositiveKd(f64),
    #[error("receptor concentration per molecule must be positive and finite (got {0})")]
    InvalidReceptor(f64),
    #[error("root finder failed: {0}")]
    RootNotFound(String),
    #[error("solution has a negative or non-finite component ({component} = {value})")]
    NonPhysical { component: usize, value: f64 },
}

/// Concentrations of every species and the fraction each contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDistribution {
    pub concentrations: Vec<f64>,
    pub fractions: Vec<f64>,
}

/// The outcome of solving one equilibrium.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesState {
    Valid(SpeciesDistribution),
    Invalid(InvalidEquilibrium),
}

impl SpeciesState {
    pub fn is_valid(&self) -> bool {
        matches!(self, SpeciesState::Valid(_))
    }

    pub fn fractions(&self) -> Option<&[f64]> {
        match self {
            SpeciesState::Valid(dist) => Some(&dist.fractions),
            SpeciesState::Invalid(_) => None,
        }
    }

    pub fn concentrations(&self) -> Option<&[f64]> {
        match self {
            SpeciesState::Valid(dist) => Some(&dist.concentrations),
            SpeciesState::Invalid(_) => None,
        }
    }

    pub fn into_result(self) -> Result<SpeciesDistribution, InvalidEquilibrium> {
        match self {
            SpeciesState::Valid(dist) => Ok(dist),
            SpeciesState::Invalid(reason) => Err(reason),
        }
    }
}
