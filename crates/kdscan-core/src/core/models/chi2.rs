use itertools::Itertools;
use std::cmp::Ordering;

/// One Kd trial: the species fractions it implied and the goodness of fit.
///
/// `chi_squared` is `None` when the fit engine failed or its log could not be
/// parsed; such records stay in the table but never enter the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquaredRecord {
    pub kd: f64,
    pub concentration: f64,
    pub fractions: Vec<f64>,
    pub chi_squared: Option<f64>,
}

impl ChiSquaredRecord {
    pub fn is_scored(&self) -> bool {
        self.chi_squared.is_some_and(f64::is_finite)
    }
}

/// All trials of one experimental concentration, ordered by Kd.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquaredCurve {
    pub concentration: f64,
    pub species_labels: Vec<String>,
    pub requested_points: usize,
    pub records: Vec<ChiSquaredRecord>,
}

impl ChiSquaredCurve {
    pub fn new(concentration: f64, species_labels: Vec<String>, requested_points: usize) -> Self {
        Self {
            concentration,
            species_labels,
            requested_points,
            records: Vec::new(),
        }
    }

    pub fn scored_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.records
            .iter()
            .filter_map(|r| r.chi_squared.filter(|c| c.is_finite()).map(|c| (r.kd, c)))
    }

    pub fn valid_points(&self) -> usize {
        self.records.iter().filter(|r| r.is_scored()).count()
    }

    /// The trial with the lowest chi-squared.
    pub fn best_fit(&self) -> Option<&ChiSquaredRecord> {
        self.records
            .iter()
            .filter(|r| r.is_scored())
            .min_by(|a, b| compare_option(a.chi_squared, b.chi_squared))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedPoint {
    pub kd: f64,
    pub chi_squared: f64,
    pub samples: usize,
}

/// Chi-squared averaged over concentrations at each Kd.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AveragedCurve {
    pub points: Vec<AveragedPoint>,
}

impl AveragedCurve {
    /// Groups scored points by equal Kd and averages their chi-squared.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let sorted: Vec<(f64, f64)> = points
            .into_iter()
            .filter(|(kd, chi2)| kd.is_finite() && chi2.is_finite())
            .sorted_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
            .collect();

        let points = sorted
            .into_iter()
            .chunk_by(|(kd, _)| *kd)
            .into_iter()
            .map(|(kd, group)| {
                let values: Vec<f64> = group.map(|(_, chi2)| chi2).collect();
                AveragedPoint {
                    kd,
                    chi_squared: values.iter().sum::<f64>() / values.len() as f64,
                    samples: values.len(),
                }
            })
            .collect();
        Self { points }
    }

    pub fn from_curves(curves: &[ChiSquaredCurve]) -> Self {
        Self::from_points(curves.iter().flat_map(|c| c.scored_points()))
    }

    pub fn kd_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.kd).collect()
    }

    pub fn chi_squared_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.chi_squared).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn best_fit(&self) -> Option<&AveragedPoint> {
        self.points.iter().min_by(|a, b| {
            a.chi_squared
                .partial_cmp(&b.chi_squared)
                .unwrap_or(Ordering::Equal)
        })
    }
}

fn compare_option(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
