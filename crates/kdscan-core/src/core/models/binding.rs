use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Stoichiometry must be at least 1 (got {0})")]
    InvalidStoichiometry(u32),
    #[error("Sequential binding requires a receptor concentration")]
    MissingReceptorConcentration,
    #[error("Receptor concentration must be positive and finite (got {0})")]
    InvalidReceptorConcentration(f64),
    #[error("Unknown binding model '{0}'. Expected 'monomer-oligomer' or 'sequential-binding'")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    MonomerOligomer,
    SequentialBinding,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::MonomerOligomer => write!(f, "monomer-oligomer"),
            ModelKind::SequentialBinding => write!(f, "sequential-binding"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "monomer-oligomer" | "oligomer" => Ok(ModelKind::MonomerOligomer),
            "sequential-binding" | "binding" => Ok(ModelKind::SequentialBinding),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }
}

/// An equilibrium model linking total concentrations to species concentrations.
///
/// `MonomerOligomer` describes `n·M ⇌ O` self-association at a single total
/// monomer concentration. `SequentialBinding` describes a receptor with `n`
/// equivalent independent sites titrated by a ligand; the receptor
/// concentration is fixed per experiment while the ligand concentration is
/// the swept quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingModel {
    MonomerOligomer {
        n: u32,
    },
    SequentialBinding {
        n: u32,
        receptor_concentration: f64,
    },
}

impl BindingModel {
    pub fn monomer_oligomer(n: u32) -> Result<Self, ModelError> {
        if n == 0 {
            return Err(ModelError::InvalidStoichiometry(n));
        }
        Ok(Self::MonomerOligomer { n })
    }

    pub fn sequential_binding(
        n: u32,
        receptor_concentration: Option<f64>,
    ) -> Result<Self, ModelError> {
        if n == 0 {
            return Err(ModelError::InvalidStoichiometry(n));
        }
        let receptor_concentration =
            receptor_concentration.ok_or(ModelError::MissingReceptorConcentration)?;
        if !(receptor_concentration.is_finite() && receptor_concentration > 0.0) {
            return Err(ModelError::InvalidReceptorConcentration(
                receptor_concentration,
            ));
        }
        Ok(Self::SequentialBinding {
            n,
            receptor_concentration,
        })
    }

    pub fn from_parts(
        kind: ModelKind,
        n: u32,
        receptor_concentration: Option<f64>,
    ) -> Result<Self, ModelError> {
        match kind {
            ModelKind::MonomerOligomer => Self::monomer_oligomer(n),
            ModelKind::SequentialBinding => Self::sequential_binding(n, receptor_concentration),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::MonomerOligomer { .. } => ModelKind::MonomerOligomer,
            Self::SequentialBinding { .. } => ModelKind::SequentialBinding,
        }
    }

    pub fn stoichiometry(&self) -> u32 {
        match *self {
            Self::MonomerOligomer { n } | Self::SequentialBinding { n, .. } => n,
        }
    }

    /// Number of species whose scattering curves enter the mixture.
    pub fn species_count(&self) -> usize {
        match *self {
            Self::MonomerOligomer { .. } => 2,
            Self::SequentialBinding { n, .. } => n as usize + 2,
        }
    }

    /// Species labels in the order used by fractions and species curves.
    pub fn species_labels(&self) -> Vec<String> {
        match *self {
            Self::MonomerOligomer { .. } => vec!["monomer".to_string(), "oligomer".to_string()],
            Self::SequentialBinding { n, .. } => (0..=n)
                .map(|j| format!("receptor_{}", j))
                .chain(std::iter::once("ligand_free".to_string()))
                .collect(),
        }
    }

    /// Receptor total actually handed to the solver.
    ///
    /// The user-facing receptor concentration counts binding sites, so the
    /// solver works with `receptor_concentration / n` receptor molecules.
    pub fn effective_receptor_concentration(&self) -> Option<f64> {
        match *self {
            Self::MonomerOligomer { .. } => None,
            Self::SequentialBinding {
                n,
                receptor_concentration,
            } => Some(receptor_concentration / n as f64),
        }
    }

    /// Intensity-unit flag passed to the fit engine by default.
    pub fn default_fit_units(&self) -> u8 {
        match self {
            Self::MonomerOligomer { .. } => 2,
            Self::SequentialBinding { .. } => 1,
        }
    }

    /// A hashable identity of the model, used to key cached analyses.
    pub fn signature(&self) -> (ModelKind, u32, u64) {
        let receptor_bits = match *self {
            Self::MonomerOligomer { .. } => 0,
            Self::SequentialBinding {
                receptor_concentration,
                ..
            } => receptor_concentration.to_bits(),
        };
        (self.kind(), self.stoichiometry(), receptor_bits)
    }
}

impl fmt::Display for BindingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MonomerOligomer { n } => write!(f, "monomer-oligomer (n = {})", n),
            Self::SequentialBinding {
                n,
                receptor_concentration,
            } => write!(
                f,
                "sequential-binding (n = {}, receptor = {})",
                n, receptor_concentration
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_binding_without_receptor_is_rejected() {
        let result = BindingModel::sequential_binding(2, None);
        assert_eq!(result, Err(ModelError::MissingReceptorConcentration));
    }

    #[test]
    fn zero_stoichiometry_is_rejected_for_both_models() {
        assert_eq!(
            BindingModel::monomer_oligomer(0),
            Err(ModelError::InvalidStoichiometry(0))
        );
        assert_eq!(
            BindingModel::sequential_binding(0, Some(1.0)),
            Err(ModelError::InvalidStoichiometry(0))
        );
    }

    #[test]
    fn non_positive_receptor_concentration_is_rejected() {
        assert!(matches!(
            BindingModel::sequential_binding(1, Some(0.0)),
            Err(ModelError::InvalidReceptorConcentration(_))
        ));
        assert!(matches!(
            BindingModel::sequential_binding(1, Some(f64::NAN)),
            Err(ModelError::InvalidReceptorConcentration(_))
        ));
    }

    #[test]
    fn species_labels_follow_model_order() {
        let mo = BindingModel::monomer_oligomer(3).unwrap();
        assert_eq!(mo.species_labels(), vec!["monomer", "oligomer"]);
        assert_eq!(mo.species_count(), 2);

        let sb = BindingModel::sequential_binding(2, Some(10.0)).unwrap();
        assert_eq!(
            sb.species_labels(),
            vec!["receptor_0", "receptor_1", "receptor_2", "ligand_free"]
        );
        assert_eq!(sb.species_count(), 4);
    }

    #[test]
    fn effective_receptor_concentration_divides_by_site_count() {
        let sb = BindingModel::sequential_binding(4, Some(20.0)).unwrap();
        assert_eq!(sb.effective_receptor_concentration(), Some(5.0));
        let mo = BindingModel::monomer_oligomer(2).unwrap();
        assert_eq!(mo.effective_receptor_concentration(), None);
    }

    #[test]
    fn model_kind_parses_common_spellings() {
        assert_eq!(
            "monomer_oligomer".parse::<ModelKind>(),
            Ok(ModelKind::MonomerOligomer)
        );
        assert_eq!(
            "Sequential-Binding".parse::<ModelKind>(),
            Ok(ModelKind::SequentialBinding)
        );
        assert!("dimer".parse::<ModelKind>().is_err());
    }

    #[test]
    fn signature_distinguishes_receptor_concentration() {
        let a = BindingModel::sequential_binding(1, Some(10.0)).unwrap();
        let b = BindingModel::sequential_binding(1, Some(20.0)).unwrap();
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.signature(), a.signature());
    }
}
