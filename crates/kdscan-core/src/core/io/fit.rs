use super::traits::{CurveFile, CurveFileError, into_columns, read_numeric_rows};
use std::io::{BufRead, Write};

/// The fit engine's output: experimental data next to the fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct FitCurve {
    pub q: Vec<f64>,
    pub experimental: Vec<f64>,
    pub sigma: Vec<f64>,
    pub fitted: Vec<f64>,
}

impl FitCurve {
    /// Normalized residuals `(I_exp − I_fit) / σ`; zero where σ is not positive.
    pub fn residuals(&self) -> Vec<f64> {
        self.experimental
            .iter()
            .zip(&self.fitted)
            .zip(&self.sigma)
            .map(|((exp, fit), sigma)| {
                if *sigma > 0.0 {
                    (exp - fit) / sigma
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}

/// Four-column fit file (`s`, `I_exp`, `σ`, `I_fit`) with one header line.
pub struct FitFile;

impl CurveFile for FitFile {
    type Data = FitCurve;

    fn read_from(reader: &mut impl BufRead) -> Result<FitCurve, CurveFileError> {
        let rows = read_numeric_rows(reader, 4)?;
        let mut columns = into_columns(rows, 4).into_iter();
        Ok(FitCurve {
            q: columns.next().unwrap_or_default(),
            experimental: columns.next().unwrap_or_default(),
            sigma: columns.next().unwrap_or_default(),
            fitted: columns.next().unwrap_or_default(),
        })
    }

    fn write_to(data: &FitCurve, writer: &mut impl Write) -> Result<(), CurveFileError> {
        writeln!(writer, "s I_exp sigma I_fit")?;
        for i in 0..data.len() {
            writeln!(
                writer,
                "{:.10e} {:.10e} {:.10e} {:.10e}",
                data.q[i], data.experimental[i], data.sigma[i], data.fitted[i]
            )?;
        }
        Ok(())
    }
}
