use super::AnalysisError;
use super::changepoint::ChangePointDetector;
use super::differentiate::{gradient, signed_curvature};
use super::savgol::SavitzkyGolay;
use super::spline::NaturalCubicSpline;
use crate::core::models::chi2::AveragedCurve;
use tracing::{debug, instrument};

/// Tuning of the L-curve analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct LCurveConfig {
    pub resample_points: usize,
    pub derivative_window: usize,
    pub curvature_window: usize,
    pub polyorder: usize,
    pub changepoint_max_window: usize,
    pub max_change_points: usize,
    pub threshold_sigmas: f64,
    pub curvature_epsilon: f64,
    /// Smoothed curvature at or below this counts as no maximum at all.
    pub curvature_floor: f64,
    /// An opposite-sign curvature peak at least this fraction of the
    /// dominant one marks a sigmoidal transition.
    pub transition_ratio: f64,
    pub min_valid_points: usize,
}

impl Default for LCurveConfig {
    fn default() -> Self {
        Self {
            resample_points: 500,
            derivative_window: 21,
            curvature_window: 51,
            polyorder: 3,
            changepoint_max_window: 20,
            max_change_points: 3,
            threshold_sigmas: 2.0,
            curvature_epsilon: 1e-10,
            curvature_floor: 1e-6,
            transition_ratio: 0.5,
            min_valid_points: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LowConfidenceReason {
    TooFewPoints { valid: usize, required: usize },
    NoCurvatureMaximum,
    MaximumAtEdge,
    DegenerateBracket,
}

impl std::fmt::Display for LowConfidenceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { valid, required } => {
                write!(f, "only {} usable points (at least {} recommended)", valid, required)
            }
            Self::NoCurvatureMaximum => write!(f, "no curvature maximum detected"),
            Self::MaximumAtEdge => write!(f, "curvature maximum at the edge of the Kd range"),
            Self::DegenerateBracket => write!(f, "uncertainty bracket carries no curvature"),
        }
    }
}

/// Outcome of an L-curve analysis.
///
/// The resampled curve is kept in log10 space on both axes so that it can be
/// plotted or exported next to its smoothed curvature.
#[derive(Debug, Clone, PartialEq)]
pub struct LCurveResult {
    pub optimal_kd: f64,
    /// `None` when the bracket gives no usable spread.
    pub kd_error: Option<f64>,
    /// Kd values bracketing the optimum: the two curvature knees of a
    /// sigmoidal transition, otherwise the nearest change points.
    pub bracket: (f64, f64),
    pub change_point_kds: Vec<f64>,
    pub optimal_index: Option<usize>,
    pub log_kd: Vec<f64>,
    pub log_chi2: Vec<f64>,
    pub curvature: Vec<f64>,
    pub valid_points: usize,
    pub confidence: Confidence,
    pub reasons: Vec<LowConfidenceReason>,
}

impl LCurveResult {
    pub fn is_confident(&self) -> bool {
        self.confidence == Confidence::High
    }
}

#[derive(Debug, Clone, Default)]
pub struct LCurveAnalyzer {
    config: LCurveConfig,
}

impl LCurveAnalyzer {
    pub fn new(config: LCurveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LCurveConfig {
        &self.config
    }

    /// Estimates the optimal Kd of a chi-squared-vs-Kd curve.
    ///
    /// A single bend resolves to its curvature maximum. A sigmoidal curve
    /// bends twice with opposite signs and resolves to the inflection
    /// between the two knees.
    ///
    /// Points with non-positive or non-finite values are ignored and
    /// duplicate Kd values are averaged. Sparse or featureless curves still
    /// produce a result, flagged [`Confidence::Low`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::LengthMismatch`] when the inputs differ in
    /// length and [`AnalysisError::InsufficientData`] when no usable point
    /// remains.
    #[instrument(skip_all, name = "lcurve_analysis")]
    pub fn analyze(&self, kd: &[f64], chi2: &[f64]) -> Result<LCurveResult, AnalysisError> {
        if kd.len() != chi2.len() {
            return Err(AnalysisError::LengthMismatch {
                kd: kd.len(),
                chi2: chi2.len(),
            });
        }

        let usable = AveragedCurve::from_points(
            kd.iter()
                .copied()
                .zip(chi2.iter().copied())
                .filter(|(k, c)| *k > 0.0 && *c > 0.0),
        );
        let valid = usable.len();
        let Some(best) = usable.best_fit() else {
            return Err(AnalysisError::InsufficientData { usable: 0 });
        };
        let fallback_kd = best.kd;

        let mut reasons = Vec::new();
        if valid < self.config.min_valid_points {
            reasons.push(LowConfidenceReason::TooFewPoints {
                valid,
                required: self.config.min_valid_points,
            });
        }

        let x: Vec<f64> = usable.kd_values().iter().map(|v| v.log10()).collect();
        let y: Vec<f64> = usable.chi_squared_values().iter().map(|v| v.log10()).collect();

        if valid < 2 {
            reasons.push(LowConfidenceReason::NoCurvatureMaximum);
            return Ok(LCurveResult {
                optimal_kd: fallback_kd,
                kd_error: None,
                bracket: (fallback_kd, fallback_kd),
                change_point_kds: Vec::new(),
                optimal_index: None,
                log_kd: x,
                log_chi2: y,
                curvature: vec![0.0],
                valid_points: valid,
                confidence: Confidence::Low,
                reasons,
            });
        }

        let spline = NaturalCubicSpline::new(&x, &y)?;
        let n = self.config.resample_points.max(2);
        let (xs, ys) = spline.resample(n);
        let (smoothed, signed) = self.smoothed_curvature(&xs, &ys);

        let detector = ChangePointDetector {
            max_window: self.config.changepoint_max_window,
            max_points: self.config.max_change_points,
            threshold_sigmas: self.config.threshold_sigmas,
        };
        let change_points = detector.detect(&smoothed);
        let change_point_kds = change_points.iter().map(|&i| 10f64.powf(xs[i])).collect();

        let (peak_index, peak) = smoothed
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });

        if !(peak > self.config.curvature_floor) {
            debug!(peak, "No curvature maximum; falling back to the minimum chi-squared.");
            reasons.push(LowConfidenceReason::NoCurvatureMaximum);
            return Ok(LCurveResult {
                optimal_kd: fallback_kd,
                kd_error: None,
                bracket: (10f64.powf(xs[0]), 10f64.powf(xs[n - 1])),
                change_point_kds,
                optimal_index: None,
                log_kd: xs,
                log_chi2: ys,
                curvature: smoothed,
                valid_points: valid,
                confidence: Confidence::Low,
                reasons,
            });
        }

        let (index, before, after) =
            match find_transition(&signed, peak_index, self.config.transition_ratio) {
                Some(transition) => {
                    debug!(
                        lower = transition.lower,
                        upper = transition.upper,
                        "Opposite-sign curvature peaks; taking the inflection between them."
                    );
                    (transition.inflection, transition.lower, transition.upper)
                }
                None => {
                    let before = change_points
                        .iter()
                        .copied()
                        .filter(|&c| c < peak_index)
                        .max()
                        .unwrap_or(0);
                    let after = change_points
                        .iter()
                        .copied()
                        .filter(|&c| c > peak_index)
                        .min()
                        .unwrap_or(n - 1);
                    (peak_index, before, after)
                }
            };

        let edge = self.config.derivative_window / 2;
        if index < edge || index + edge >= n {
            reasons.push(LowConfidenceReason::MaximumAtEdge);
        }

        let optimal_kd = 10f64.powf(xs[index]);
        let kd_error = log_spread(&xs[before..after], &smoothed[before..after])
            .map(|sigma| (10f64.powf(sigma) - 1.0) * optimal_kd);
        if kd_error.is_none() {
            reasons.push(LowConfidenceReason::DegenerateBracket);
        }

        let confidence = if reasons.is_empty() {
            Confidence::High
        } else {
            Confidence::Low
        };
        debug!(optimal_kd, ?kd_error, index, ?confidence, "L-curve analysis complete.");

        Ok(LCurveResult {
            optimal_kd,
            kd_error,
            bracket: (10f64.powf(xs[before]), 10f64.powf(xs[after])),
            change_point_kds,
            optimal_index: Some(index),
            log_kd: xs,
            log_chi2: ys,
            curvature: smoothed,
            valid_points: valid,
            confidence,
            reasons,
        })
    }

    /// Smoothed unsigned and signed curvature of the resampled curve.
    fn smoothed_curvature(&self, xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let derivative = SavitzkyGolay::new(self.config.derivative_window, self.config.polyorder);
        let dx = derivative.smooth(&gradient(xs));
        let dy = derivative.smooth(&gradient(ys));
        let d2x = derivative.smooth(&gradient(&dx));
        let d2y = derivative.smooth(&gradient(&dy));
        let raw = signed_curvature(&dx, &dy, &d2x, &d2y, self.config.curvature_epsilon);
        let magnitude: Vec<f64> = raw.iter().map(|k| k.abs()).collect();
        let smoother = SavitzkyGolay::new(self.config.curvature_window, self.config.polyorder);
        (smoother.smooth(&magnitude), smoother.smooth(&raw))
    }
}

/// Resampled indices of a sigmoidal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    lower: usize,
    inflection: usize,
    upper: usize,
}

/// Pairs the dominant curvature peak with the strongest peak of opposite
/// sign and locates the sign change between them.
fn find_transition(signed: &[f64], peak: usize, ratio: f64) -> Option<Transition> {
    let dominant = *signed.get(peak)?;
    let orientation = if dominant >= 0.0 { 1.0 } else { -1.0 };
    let (partner, strength) = signed
        .iter()
        .map(|v| -orientation * v)
        .enumerate()
        .fold((peak, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
    if !(strength > 0.0 && strength >= ratio * dominant.abs()) {
        return None;
    }

    let (lower, upper) = (peak.min(partner), peak.max(partner));
    let inflection = (lower..upper)
        .find(|&i| (signed[i] > 0.0) != (signed[i + 1] > 0.0))
        .map(|i| if signed[i].abs() <= signed[i + 1].abs() { i } else { i + 1 })?;
    Some(Transition {
        lower,
        inflection,
        upper,
    })
}

/// Curvature-weighted standard deviation of log10 Kd over a bracket.
fn log_spread(log_kd: &[f64], curvature: &[f64]) -> Option<f64> {
    let peak = curvature.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(peak > 0.0) {
        return None;
    }
    let weights: Vec<f64> = curvature.iter().map(|c| c.max(0.0) / peak).collect();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    let mean = weights.iter().zip(log_kd).map(|(w, x)| w * x).sum::<f64>() / total;
    let variance = weights
        .iter()
        .zip(log_kd)
        .map(|(w, x)| w * (x - mean).powi(2))
        .sum::<f64>()
        / total;
    Some(variance.sqrt())
}
