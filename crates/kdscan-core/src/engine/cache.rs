use crate::core::analysis::{AnalysisError, LCurveAnalyzer, LCurveResult};
use crate::core::models::binding::{BindingModel, ModelKind};
use crate::core::models::chi2::AveragedCurve;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CurveKey {
    kd_bits: Vec<u64>,
    chi2_bits: Vec<u64>,
    model: Option<(ModelKind, u32, u64)>,
}

impl CurveKey {
    fn new(curve: &AveragedCurve, model: Option<&BindingModel>) -> Self {
        Self {
            kd_bits: curve.points.iter().map(|p| p.kd.to_bits()).collect(),
            chi2_bits: curve.points.iter().map(|p| p.chi_squared.to_bits()).collect(),
            model: model.map(BindingModel::signature),
        }
    }
}

/// Memoized L-curve results keyed by curve contents and binding model.
#[derive(Debug, Default)]
pub struct LCurveCache {
    analyzer: LCurveAnalyzer,
    results: HashMap<CurveKey, LCurveResult>,
}

impl LCurveCache {
    pub fn new(analyzer: LCurveAnalyzer) -> Self {
        Self {
            analyzer,
            results: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get_or_compute(
        &mut self,
        curve: &AveragedCurve,
        model: Option<&BindingModel>,
    ) -> Result<&LCurveResult, AnalysisError> {
        match self.results.entry(CurveKey::new(curve, model)) {
            Entry::Occupied(entry) => {
                debug!("Reusing cached L-curve analysis.");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let result = self
                    .analyzer
                    .analyze(&curve.kd_values(), &curve.chi_squared_values())?;
                Ok(entry.insert(result))
            }
        }
    }
}
