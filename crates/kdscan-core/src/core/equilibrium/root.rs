use nalgebra::{DMatrix, DVector};
use thiserror::Error;

const ARMIJO_CONSTANT: f64 = 1e-4;
const ROUNDOFF_STEP_TOLERANCE: f64 = 1e-6;
const MIN_DIFFERENCE_SCALE: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootFindError {
    #[error("residual is not finite at iteration {iteration}")]
    NonFinite { iteration: usize },
    #[error("Jacobian is singular at iteration {iteration}")]
    SingularJacobian { iteration: usize },
    #[error("line search could not reduce the residual at iteration {iteration}")]
    Stalled { iteration: usize },
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

/// A square system of nonlinear equations `F(x) = 0`.
pub trait NonlinearSystem {
    fn dimension(&self) -> usize;

    fn residuals(&self, x: &DVector<f64>) -> DVector<f64>;
}

/// Damped Newton iteration with a forward-difference Jacobian.
///
/// Each step solves `J·dx = -F` by LU decomposition and backtracks along `dx`
/// until `‖F‖²` satisfies the Armijo condition. Iteration stops when the step
/// is small relative to the iterate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolver {
    pub max_iterations: usize,
    pub step_tolerance: f64,
    pub max_backtracks: usize,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            step_tolerance: 1e-10,
            max_backtracks: 60,
        }
    }
}

impl NewtonSolver {
    pub fn solve<S: NonlinearSystem>(
        &self,
        system: &S,
        seed: DVector<f64>,
    ) -> Result<DVector<f64>, RootFindError> {
        let mut x = seed;
        let mut f = system.residuals(&x);
        if !all_finite(&f) {
            return Err(RootFindError::NonFinite { iteration: 0 });
        }

        for iteration in 0..self.max_iterations {
            let jacobian = forward_difference_jacobian(system, &x, &f);
            let step = jacobian
                .lu()
                .solve(&(-&f))
                .filter(all_finite)
                .ok_or(RootFindError::SingularJacobian { iteration })?;

            let scale = x.amax().max(f64::MIN_POSITIVE);
            let step_size = step.amax();
            if step_size <= self.step_tolerance * scale {
                x += &step;
                return Ok(x);
            }

            let merit = f.norm_squared();
            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..self.max_backtracks {
                let trial = &x + &step * alpha;
                let trial_f = system.residuals(&trial);
                if all_finite(&trial_f)
                    && trial_f.norm_squared() <= (1.0 - 2.0 * ARMIJO_CONSTANT * alpha) * merit
                {
                    accepted = Some((trial, trial_f));
                    break;
                }
                alpha *= 0.5;
            }

            match accepted {
                Some((next_x, next_f)) => {
                    x = next_x;
                    f = next_f;
                }
                // Newton direction with no decrease: the residual is at its round-off floor.
                None if step_size <= ROUNDOFF_STEP_TOLERANCE * scale => return Ok(x),
                None => return Err(RootFindError::Stalled { iteration }),
            }
        }

        Err(RootFindError::NoConvergence {
            iterations: self.max_iterations,
        })
    }
}

fn forward_difference_jacobian<S: NonlinearSystem>(
    system: &S,
    x: &DVector<f64>,
    f: &DVector<f64>,
) -> DMatrix<f64> {
    let n = system.dimension();
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut jacobian = DMatrix::zeros(f.len(), n);
    let mut shifted = x.clone();

    for j in 0..n {
        let h = sqrt_eps * x[j].abs().max(MIN_DIFFERENCE_SCALE);
        shifted[j] = x[j] + h;
        let actual_h = shifted[j] - x[j];
        let f_shifted = system.residuals(&shifted);
        jacobian.set_column(j, &((f_shifted - f) / actual_h));
        shifted[j] = x[j];
    }
    jacobian
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|value| value.is_finite())
}
