//! L-curve analysis of chi-squared-vs-Kd curves.
//!
//! The curve is moved to log10 space on both axes, interpolated with a
//! natural cubic spline and resampled on an even grid. Derivatives come from
//! finite differences smoothed with a Savitzky–Golay filter, and the optimal
//! Kd is the point of maximum smoothed curvature. Change points of the
//! curvature bracket the transition and give a curvature-weighted spread of
//! log10 Kd, reported as `(10^σ − 1)·Kd`.

pub mod changepoint;
pub mod differentiate;
pub mod lcurve;
pub mod savgol;
pub mod spline;

pub use lcurve::{Confidence, LCurveAnalyzer, LCurveConfig, LCurveResult, LowConfidenceReason};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Kd and chi-squared inputs differ in length ({kd} vs {chi2})")]
    LengthMismatch { kd: usize, chi2: usize },
    #[error("Not enough usable points for analysis (found {usable})")]
    InsufficientData { usable: usize },
    #[error("Abscissa must be strictly increasing")]
    UnsortedAbscissa,
}
