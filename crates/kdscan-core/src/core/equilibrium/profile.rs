use super::{EquilibriumInput, EquilibriumSolver};
use crate::core::grid::{self, GridError};
use crate::core::models::binding::BindingModel;

/// Spacing of the concentration axis of a fraction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    #[default]
    Logarithmic,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationRange {
    pub min: f64,
    pub max: f64,
    pub points: usize,
    pub spacing: Spacing,
}

impl ConcentrationRange {
    pub fn grid(&self) -> Result<Vec<f64>, GridError> {
        match self.spacing {
            Spacing::Logarithmic => grid::log_space(self.min, self.max, self.points),
            Spacing::Linear => grid::linear_space(self.min, self.max, self.points),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub concentration: f64,
    /// `None` where the equilibrium has no physical solution.
    pub fractions: Option<Vec<f64>>,
}

/// Species fractions over a concentration range at one fixed Kd.
#[derive(Debug, Clone, PartialEq)]
pub struct FractionProfile {
    pub kd: f64,
    pub species_labels: Vec<String>,
    pub rows: Vec<ProfileRow>,
}

impl FractionProfile {
    pub fn missing_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.fractions.is_none()).count()
    }
}

pub fn generate(model: &BindingModel, kd: f64, concentrations: &[f64]) -> FractionProfile {
    let rows = concentrations
        .iter()
        .map(|&concentration| ProfileRow {
            concentration,
            fractions: model
                .solve(EquilibriumInput { concentration, kd })
                .fractions()
                .map(<[f64]>::to_vec),
        })
        .collect();

    FractionProfile {
        kd,
        species_labels: model.species_labels(),
        rows,
    }
}
