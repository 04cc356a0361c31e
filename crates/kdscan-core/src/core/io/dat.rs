use super::traits::{CurveFile, CurveFileError, into_columns, read_numeric_rows};
use crate::core::models::curve::ScatteringCurve;
use std::io::{BufRead, Write};

/// An experimental profile with per-point uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalCurve {
    pub curve: ScatteringCurve,
    pub sigma: Vec<f64>,
}

/// Three-column experimental data file (`q`, `I(q)`, `σ`). Every `σ` must be
/// positive.
pub struct DatFile;

impl CurveFile for DatFile {
    type Data = ExperimentalCurve;

    fn read_from(reader: &mut impl BufRead) -> Result<ExperimentalCurve, CurveFileError> {
        let rows = read_numeric_rows(reader, 3)?;
        let mut columns = into_columns(rows, 3).into_iter();
        let q = columns.next().unwrap_or_default();
        let intensity = columns.next().unwrap_or_default();
        let sigma = columns.next().unwrap_or_default();
        if let Some((index, &value)) = sigma
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(CurveFileError::NonPositiveSigma {
                row: index + 1,
                value,
            });
        }
        Ok(ExperimentalCurve {
            curve: ScatteringCurve::new(q, intensity)?,
            sigma,
        })
    }

    fn write_to(data: &ExperimentalCurve, writer: &mut impl Write) -> Result<(), CurveFileError> {
        for ((q, intensity), sigma) in data.curve.points().zip(&data.sigma) {
            writeln!(writer, "{:.10e} {:.10e} {:.10e}", q, intensity, sigma)?;
        }
        Ok(())
    }
}
