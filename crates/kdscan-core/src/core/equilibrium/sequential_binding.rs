use super::root::{NewtonSolver, NonlinearSystem};
use super::{EquilibriumInput, check_physical, validate_input};
use crate::core::models::species::{InvalidEquilibrium, SpeciesDistribution, SpeciesState};
use nalgebra::DVector;
use tracing::trace;

/// Receptor occupancy states `R_0..R_n` plus free ligand, for `n` equivalent sites.
///
/// Unknowns are ordered `[R_0, …, R_n, L_free]`. Equations:
/// `Σ R_j = R_tot`, `L_free + Σ j·R_j = L_tot`, and for `j = 1..n`
/// `(j / (n − j + 1))·Kd·R_j = R_{j−1}·L_free`.
struct SequentialBindingSystem {
    receptor_total: f64,
    ligand_total: f64,
    kd: f64,
    n: usize,
}

impl NonlinearSystem for SequentialBindingSystem {
    fn dimension(&self) -> usize {
        self.n + 2
    }

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.n;
        let ligand_free = x[n + 1];
        let receptor = x.rows(0, n + 1);

        let mut f = DVector::zeros(n + 2);
        f[0] = receptor.sum() - self.receptor_total;
        f[1] = ligand_free
            + receptor
                .iter()
                .enumerate()
                .map(|(j, r)| j as f64 * r)
                .sum::<f64>()
            - self.ligand_total;
        for j in 1..=n {
            let statistical_factor = j as f64 / (n - j + 1) as f64;
            f[j + 1] = statistical_factor * self.kd * receptor[j] - receptor[j - 1] * ligand_free;
        }
        f
    }
}

impl SequentialBindingSystem {
    fn geometric_seed(&self) -> DVector<f64> {
        let mut seed = DVector::zeros(self.n + 2);
        for j in 0..=self.n {
            seed[j] = self.receptor_total / 10f64.powi(j as i32);
        }
        seed[self.n + 1] = self.ligand_total;
        seed
    }

    /// Occupancies of independent sites: binomial in the site saturation `L/(Kd + L)`.
    fn binomial_seed(&self) -> DVector<f64> {
        let (n, kd, r, l) = (self.n, self.kd, self.receptor_total, self.ligand_total);
        let b = kd + n as f64 * r - l;
        let disc = (b * b + 4.0 * l * kd).sqrt();
        let ligand_free = if b < 0.0 {
            (disc - b) / 2.0
        } else {
            2.0 * l * kd / (b + disc)
        };
        let occupied = ligand_free / (kd + ligand_free);
        let empty = kd / (kd + ligand_free);

        let mut seed = DVector::zeros(n + 2);
        let mut binomial = 1.0;
        for j in 0..=n {
            seed[j] = r * binomial * occupied.powi(j as i32) * empty.powi((n - j) as i32);
            binomial = binomial * (n - j) as f64 / (j + 1) as f64;
        }
        seed[n + 1] = ligand_free;
        seed
    }
}

pub(super) fn solve(
    n: u32,
    receptor_total: f64,
    input: EquilibriumInput,
    solver: &NewtonSolver,
) -> SpeciesState {
    if let Err(reason) = validate_input(&input) {
        return SpeciesState::Invalid(reason);
    }
    if !(receptor_total.is_finite() && receptor_total > 0.0) {
        return SpeciesState::Invalid(InvalidEquilibrium::InvalidReceptor(receptor_total));
    }

    let system = SequentialBindingSystem {
        receptor_total,
        ligand_total: input.concentration,
        kd: input.kd,
        n: n as usize,
    };
    let scale = receptor_total.max(input.concentration);

    let first_attempt = solver
        .solve(&system, system.geometric_seed())
        .map_err(|e| InvalidEquilibrium::RootNotFound(e.to_string()))
        .and_then(|x| check_physical(x.as_slice(), scale));

    let concentrations = match first_attempt {
        Ok(c) => c,
        Err(reason) => {
            // The geometric seed can land on a non-physical root when ligand is limiting.
            trace!(%reason, kd = input.kd, "Retrying sequential binding from binomial seed.");
            let retry = solver
                .solve(&system, system.binomial_seed())
                .map_err(|e| InvalidEquilibrium::RootNotFound(e.to_string()))
                .and_then(|x| check_physical(x.as_slice(), scale));
            match retry {
                Ok(c) => c,
                Err(reason) => return SpeciesState::Invalid(reason),
            }
        }
    };

    let ligand_free = concentrations[n as usize + 1];
    let denominator = receptor_total + ligand_free;
    let fractions = concentrations.iter().map(|c| c / denominator).collect();
    SpeciesState::Valid(SpeciesDistribution {
        concentrations,
        fractions,
    })
}
