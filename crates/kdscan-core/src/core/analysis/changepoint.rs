use std::f64::consts::PI;

/// Sliding-window Gaussian likelihood change-point detector.
#[derive(Debug, Clone)]
pub struct ChangePointDetector {
    pub max_window: usize,
    pub max_points: usize,
    pub threshold_sigmas: f64,
}

impl Default for ChangePointDetector {
    fn default() -> Self {
        Self {
            max_window: 20,
            max_points: 3,
            threshold_sigmas: 2.0,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let mu = mean(values);
    (values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

impl ChangePointDetector {
    /// Window length used for a sequence of `len` samples.
    pub fn window_for(&self, len: usize) -> usize {
        self.max_window.min(len / 4)
    }

    /// Indices where the local Gaussian log-likelihood changes abruptly.
    ///
    /// Candidates are taken left to right and kept only when at least half a
    /// window from the previously kept one, up to `max_points`.
    pub fn detect(&self, values: &[f64]) -> Vec<usize> {
        let window = self.window_for(values.len());
        if window < 2 {
            return Vec::new();
        }

        let scores: Vec<f64> = values
            .windows(window)
            .take(values.len() - window)
            .map(|segment| {
                let mu = mean(segment);
                let sigma = std_dev(segment) + 1e-8;
                let variance = sigma * sigma;
                segment
                    .iter()
                    .map(|v| -0.5 * (2.0 * PI * variance).ln() - (v - mu).powi(2) / (2.0 * variance))
                    .sum()
            })
            .collect();
        if scores.is_empty() {
            return Vec::new();
        }

        let jumps: Vec<f64> = super::differentiate::gradient(&scores)
            .into_iter()
            .map(f64::abs)
            .collect();
        let threshold = mean(&jumps) + self.threshold_sigmas * std_dev(&jumps);

        let min_separation = window / 2;
        let mut points: Vec<usize> = Vec::new();
        for (index, _) in jumps.iter().enumerate().filter(|(_, j)| **j > threshold) {
            if points.last().is_none_or(|last| index - last >= min_separation) {
                points.push(index);
                if points.len() >= self.max_points {
                    break;
                }
            }
        }
        points
    }
}
