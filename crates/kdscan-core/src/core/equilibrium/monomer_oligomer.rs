use super::root::{NewtonSolver, NonlinearSystem};
use super::{EquilibriumInput, check_physical, validate_input};
use crate::core::models::species::{InvalidEquilibrium, SpeciesDistribution, SpeciesState};
use nalgebra::DVector;

/// `n·M ⇌ O` with `Kd·[O] = [M]^n` and `Ctot = [M] + n·[O]`.
struct MonomerOligomerSystem {
    total: f64,
    kd: f64,
    n: i32,
}

impl NonlinearSystem for MonomerOligomerSystem {
    fn dimension(&self) -> usize {
        2
    }

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        let (monomer, oligomer) = (x[0], x[1]);
        DVector::from_vec(vec![
            monomer + self.n as f64 * oligomer - self.total,
            self.kd * oligomer - monomer.powi(self.n),
        ])
    }
}

pub(super) fn solve(n: u32, input: EquilibriumInput, solver: &NewtonSolver) -> SpeciesState {
    if let Err(reason) = validate_input(&input) {
        return SpeciesState::Invalid(reason);
    }
    let system = MonomerOligomerSystem {
        total: input.concentration,
        kd: input.kd,
        n: n as i32,
    };
    let seed = DVector::from_vec(vec![input.concentration, input.concentration / 3.0]);

    let solution = match solver.solve(&system, seed) {
        Ok(x) => x,
        Err(e) => return SpeciesState::Invalid(InvalidEquilibrium::RootNotFound(e.to_string())),
    };
    let concentrations = match check_physical(solution.as_slice(), input.concentration) {
        Ok(c) => c,
        Err(reason) => return SpeciesState::Invalid(reason),
    };

    let total = input.concentration;
    let fractions = vec![
        concentrations[0] / total,
        n as f64 * concentrations[1] / total,
    ];
    SpeciesState::Valid(SpeciesDistribution {
        concentrations,
        fractions,
    })
}
