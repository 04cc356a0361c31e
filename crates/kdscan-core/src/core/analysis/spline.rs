use super::AnalysisError;

/// Natural cubic spline through strictly increasing knots.
///
/// Second derivatives vanish at both ends. With two knots the spline is the
/// straight line between them.
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalCubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl NaturalCubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, AnalysisError> {
        if x.len() != y.len() {
            return Err(AnalysisError::LengthMismatch {
                kd: x.len(),
                chi2: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(AnalysisError::InsufficientData { usable: x.len() });
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(AnalysisError::UnsortedAbscissa);
        }

        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Tridiagonal system for the interior second derivatives (Thomas algorithm).
        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];
        for i in 1..n - 1 {
            let lower = h[i - 1];
            let diag = 2.0 * (h[i - 1] + h[i]);
            let upper = h[i];
            let rhs = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            let denom = diag - lower * c_prime[i - 1];
            c_prime[i] = upper / denom;
            d_prime[i] = (rhs - lower * d_prime[i - 1]) / denom;
        }

        let mut second_derivatives = vec![0.0; n];
        for i in (1..n - 1).rev() {
            second_derivatives[i] = d_prime[i] - c_prime[i] * second_derivatives[i + 1];
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            second_derivatives,
        })
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        let n = self.x.len();
        let k = match self.x.partition_point(|&v| v <= t) {
            0 => 0,
            p if p >= n => n - 2,
            p => p - 1,
        };
        let h = self.x[k + 1] - self.x[k];
        let a = (self.x[k + 1] - t) / h;
        let b = (t - self.x[k]) / h;
        a * self.y[k]
            + b * self.y[k + 1]
            + ((a.powi(3) - a) * self.second_derivatives[k]
                + (b.powi(3) - b) * self.second_derivatives[k + 1])
                * h
                * h
                / 6.0
    }

    /// Evaluates the spline on `points` evenly spaced abscissas spanning the knots.
    pub fn resample(&self, points: usize) -> (Vec<f64>, Vec<f64>) {
        let (first, last) = (self.x[0], self.x[self.x.len() - 1]);
        let step = if points > 1 {
            (last - first) / (points as f64 - 1.0)
        } else {
            0.0
        };
        let xs: Vec<f64> = (0..points).map(|i| first + step * i as f64).collect();
        let ys = xs.iter().map(|&t| self.evaluate(t)).collect();
        (xs, ys)
    }
}
