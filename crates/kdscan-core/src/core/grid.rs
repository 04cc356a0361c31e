use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid range: min={min}, max={max} (must be finite, >0, and max>min)")]
    InvalidRange { min: f64, max: f64 },
    #[error("A grid needs at least 2 points (got {0})")]
    TooFewPoints(usize),
    #[error(
        "Rounding to {decimals} decimals left {retained} distinct positive Kd values out of {requested}"
    )]
    Exhausted {
        requested: usize,
        retained: usize,
        decimals: u32,
    },
}

fn check_range(min: f64, max: f64, points: usize, positive: bool) -> Result<(), GridError> {
    let lower_ok = if positive { min > 0.0 } else { min >= 0.0 };
    if !(min.is_finite() && max.is_finite() && lower_ok && max > min) {
        return Err(GridError::InvalidRange { min, max });
    }
    if points < 2 {
        return Err(GridError::TooFewPoints(points));
    }
    Ok(())
}

/// `points` log-spaced values between `min` and `max`, both included exactly.
pub fn log_space(min: f64, max: f64, points: usize) -> Result<Vec<f64>, GridError> {
    check_range(min, max, points, true)?;
    let (log_min, log_max) = (min.log10(), max.log10());
    let step = (log_max - log_min) / (points as f64 - 1.0);

    let mut out: Vec<f64> = (0..points)
        .map(|i| 10f64.powf(log_min + step * i as f64))
        .collect();
    out[0] = min;
    out[points - 1] = max;
    Ok(out)
}

/// `points` evenly spaced values between `min` and `max`, both included.
pub fn linear_space(min: f64, max: f64, points: usize) -> Result<Vec<f64>, GridError> {
    check_range(min, max, points, false)?;
    let step = (max - min) / (points as f64 - 1.0);
    let mut out: Vec<f64> = (0..points).map(|i| min + step * i as f64).collect();
    out[points - 1] = max;
    Ok(out)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// The trial Kd values of a sweep.
///
/// Values are log-spaced and rounded to a fixed number of decimals so that
/// artifact names derived from them are reproducible. Rounding can collapse
/// the low end of a wide range onto zero or onto duplicates; those values are
/// dropped, keeping the grid strictly increasing and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct KdGrid {
    values: Vec<f64>,
    decimals: u32,
    requested: usize,
}

impl KdGrid {
    pub fn log_spaced(min: f64, max: f64, points: usize, decimals: u32) -> Result<Self, GridError> {
        let raw = log_space(min, max, points)?;
        let mut values: Vec<f64> = Vec::with_capacity(raw.len());
        for value in raw.into_iter().map(|v| round_to(v, decimals)) {
            if value > 0.0 && values.last().is_none_or(|last| value > *last) {
                values.push(value);
            }
        }

        let dropped = points - values.len();
        if dropped > 0 {
            warn!(
                dropped,
                decimals, "Kd values collapsed by rounding were removed from the grid."
            );
        }
        if values.len() < 2 {
            return Err(GridError::Exhausted {
                requested: points,
                retained: values.len(),
                decimals,
            });
        }

        Ok(Self {
            values,
            decimals,
            requested: points,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Fixed-precision text of a Kd, as used in artifact names.
    pub fn format_kd(&self, kd: f64) -> String {
        format!("{:.*}", self.decimals as usize, kd)
    }
}
