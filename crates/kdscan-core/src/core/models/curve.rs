use thiserror::Error;

const ABSCISSA_RELATIVE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("Curve is empty")]
    Empty,
    #[error("Column length mismatch: {abscissa} abscissa values vs {intensity} intensities")]
    LengthMismatch { abscissa: usize, intensity: usize },
    #[error("Non-finite value at row {row}")]
    NonFinite { row: usize },
    #[error("Curves do not share an abscissa (curve {index} differs at row {row})")]
    AbscissaMismatch { index: usize, row: usize },
    #[error("Expected {expected} weights for {expected} curves, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("No curves to combine")]
    NoCurves,
}

/// An intensity profile sampled on a scattering-vector abscissa.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringCurve {
    q: Vec<f64>,
    intensity: Vec<f64>,
}

impl ScatteringCurve {
    pub fn new(q: Vec<f64>, intensity: Vec<f64>) -> Result<Self, CurveError> {
        if q.len() != intensity.len() {
            return Err(CurveError::LengthMismatch {
                abscissa: q.len(),
                intensity: intensity.len(),
            });
        }
        if q.is_empty() {
            return Err(CurveError::Empty);
        }
        if let Some(row) = q
            .iter()
            .zip(&intensity)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(CurveError::NonFinite { row });
        }
        Ok(Self { q, intensity })
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.q.iter().copied().zip(self.intensity.iter().copied())
    }

    /// Returns the first row at which the abscissas differ, if any.
    fn abscissa_mismatch(&self, other: &ScatteringCurve) -> Option<usize> {
        if self.len() != other.len() {
            return Some(self.len().min(other.len()));
        }
        self.q.iter().zip(&other.q).position(|(a, b)| {
            let scale = a.abs().max(b.abs()).max(f64::MIN_POSITIVE);
            (a - b).abs() > ABSCISSA_RELATIVE_TOLERANCE * scale
        })
    }

    pub fn shares_abscissa(&self, other: &ScatteringCurve) -> bool {
        self.abscissa_mismatch(other).is_none()
    }

    /// Checks that every curve shares the abscissa of the first one.
    pub fn ensure_common_abscissa(curves: &[ScatteringCurve]) -> Result<(), CurveError> {
        let first = curves.first().ok_or(CurveError::NoCurves)?;
        for (index, curve) in curves.iter().enumerate().skip(1) {
            if let Some(row) = first.abscissa_mismatch(curve) {
                return Err(CurveError::AbscissaMismatch { index, row });
            }
        }
        Ok(())
    }

    /// Point-wise mean of several profiles of the same state.
    pub fn average(curves: &[ScatteringCurve]) -> Result<ScatteringCurve, CurveError> {
        Self::ensure_common_abscissa(curves)?;
        let weight = 1.0 / curves.len() as f64;
        Self::mix(curves, &vec![weight; curves.len()])
    }

    /// Linear combination `Σ w_k · I_k(q)` on the shared abscissa.
    pub fn mix(curves: &[ScatteringCurve], weights: &[f64]) -> Result<ScatteringCurve, CurveError> {
        let first = curves.first().ok_or(CurveError::NoCurves)?;
        if weights.len() != curves.len() {
            return Err(CurveError::WeightCountMismatch {
                expected: curves.len(),
                actual: weights.len(),
            });
        }
        Self::ensure_common_abscissa(curves)?;

        let mut intensity = vec![0.0; first.len()];
        for (curve, &w) in curves.iter().zip(weights) {
            for (acc, value) in intensity.iter_mut().zip(&curve.intensity) {
                *acc += w * value;
            }
        }
        Ok(ScatteringCurve {
            q: first.q.clone(),
            intensity,
        })
    }
}
