//! Equilibrium solvers for the supported binding models.
//!
//! Both models reduce to a square system of mass-action and conservation
//! equations that is solved numerically by [`root::NewtonSolver`] from a
//! deterministic seed. A solve never panics or errors: a system without a
//! physical root (negative or non-finite component, failed convergence,
//! non-positive input) yields [`SpeciesState::Invalid`] and the caller
//! decides whether to drop the point.
//!
//! - **MonomerOligomer(n)** solves `Kd·[O] = [M]^n`, `Ctot = [M] + n·[O]`
//!   from the seed `([M], [O]) = (Ctot, Ctot/3)`. Fractions are
//!   `[M]/Ctot` and `n·[O]/Ctot`.
//! - **SequentialBinding(n)** solves for `R_0..R_n` and `L_free` at a fixed
//!   receptor total, seeded with `R_j = R_tot/10^j`, `L_free = L_tot`.
//!   Fractions are each concentration over `R_tot + L_free`.
//!
//! [`profile`] evaluates the fractions over a concentration range for display.

pub mod monomer_oligomer;
pub mod profile;
pub mod root;
pub mod sequential_binding;

use crate::core::models::binding::BindingModel;
use crate::core::models::species::{InvalidEquilibrium, SpeciesState};
use root::NewtonSolver;

/// Relative magnitude below which a negative component counts as round-off.
const NEGATIVE_ROUNDOFF: f64 = 1e-12;

/// The swept concentration and the trial dissociation constant.
///
/// For `MonomerOligomer` the concentration is the total monomer
/// concentration; for `SequentialBinding` it is the total ligand
/// concentration, the receptor total being carried by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumInput {
    pub concentration: f64,
    pub kd: f64,
}

/// Solves an equilibrium for one concentration and Kd.
pub trait EquilibriumSolver {
    fn solve(&self, input: EquilibriumInput) -> SpeciesState;

    fn solve_with(&self, input: EquilibriumInput, solver: &NewtonSolver) -> SpeciesState;
}

impl EquilibriumSolver for BindingModel {
    fn solve(&self, input: EquilibriumInput) -> SpeciesState {
        self.solve_with(input, &NewtonSolver::default())
    }

    fn solve_with(&self, input: EquilibriumInput, solver: &NewtonSolver) -> SpeciesState {
        match *self {
            BindingModel::MonomerOligomer { n } => monomer_oligomer::solve(n, input, solver),
            BindingModel::SequentialBinding { n, .. } => {
                match self.effective_receptor_concentration() {
                    Some(total) if total.is_finite() && total > 0.0 => {
                        sequential_binding::solve(n, total, input, solver)
                    }
                    other => SpeciesState::Invalid(InvalidEquilibrium::InvalidReceptor(
                        other.unwrap_or(f64::NAN),
                    )),
                }
            }
        }
    }
}

fn validate_input(input: &EquilibriumInput) -> Result<(), InvalidEquilibrium> {
    if !(input.concentration.is_finite() && input.concentration > 0.0) {
        return Err(InvalidEquilibrium::NonPositiveTotal(input.concentration));
    }
    if !(input.kd.is_finite() && input.kd > 0.0) {
        return Err(InvalidEquilibrium::NonPositiveKd(input.kd));
    }
    Ok(())
}

/// Rejects negative or non-finite components; clamps round-off negatives to zero.
fn check_physical(solution: &[f64], scale: f64) -> Result<Vec<f64>, InvalidEquilibrium> {
    solution
        .iter()
        .enumerate()
        .map(|(component, &value)| {
            if !value.is_finite() || value < -NEGATIVE_ROUNDOFF * scale {
                Err(InvalidEquilibrium::NonPhysical { component, value })
            } else {
                Ok(value.max(0.0))
            }
        })
        .collect()
}
