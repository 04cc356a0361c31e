use nalgebra::DMatrix;

/// Savitzky–Golay smoothing filter.
///
/// Interior points take the value at the centre of a least-squares polynomial
/// fitted over the surrounding window. The first and last half-windows are
/// evaluated from the polynomial fitted to the first and last full windows.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    polyorder: usize,
}

impl SavitzkyGolay {
    pub fn new(window: usize, polyorder: usize) -> Self {
        Self { window, polyorder }
    }

    pub fn smooth(&self, y: &[f64]) -> Vec<f64> {
        let n = y.len();
        let mut window = self.window.min(n);
        if window % 2 == 0 {
            window = window.saturating_sub(1);
        }
        if window <= self.polyorder || window < 3 {
            return y.to_vec();
        }

        let half = window / 2;
        let scale = half as f64;
        let order = self.polyorder + 1;
        let design = DMatrix::from_fn(window, order, |i, k| {
            ((i as f64 - scale) / scale).powi(k as i32)
        });
        let Ok(projection) = design.pseudo_inverse(1e-12) else {
            return y.to_vec();
        };

        let fit = |start: usize| -> Vec<f64> {
            (0..order)
                .map(|k| (0..window).map(|j| projection[(k, j)] * y[start + j]).sum())
                .collect()
        };
        let evaluate = |coefficients: &[f64], t: f64| -> f64 {
            coefficients
                .iter()
                .enumerate()
                .map(|(k, c)| c * t.powi(k as i32))
                .sum()
        };

        let mut out = vec![0.0; n];
        for (i, value) in out.iter_mut().enumerate().take(n - half).skip(half) {
            *value = (0..window)
                .map(|j| projection[(0, j)] * y[i - half + j])
                .sum();
        }

        let left = fit(0);
        for (i, value) in out.iter_mut().enumerate().take(half) {
            *value = evaluate(&left, (i as f64 - scale) / scale);
        }
        let right_start = n - window;
        let right = fit(right_start);
        for (i, value) in out.iter_mut().enumerate().skip(n - half) {
            *value = evaluate(&right, ((i - right_start) as f64 - scale) / scale);
        }
        out
    }
}
