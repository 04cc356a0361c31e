use super::traits::{CurveFile, CurveFileError, into_columns, read_numeric_rows};
use crate::core::models::curve::ScatteringCurve;
use std::io::{BufRead, Write};

/// Two-column theoretical intensity profile (`q`, `I(q)`).
///
/// Files produced by scattering calculators carry a text header and extra
/// columns (vacuum, excluded volume, hydration shell); only the first two
/// columns are read. Written files carry no header.
pub struct IntFile;

impl CurveFile for IntFile {
    type Data = ScatteringCurve;

    fn read_from(reader: &mut impl BufRead) -> Result<ScatteringCurve, CurveFileError> {
        let rows = read_numeric_rows(reader, 2)?;
        let mut columns = into_columns(rows, 2).into_iter();
        let q = columns.next().unwrap_or_default();
        let intensity = columns.next().unwrap_or_default();
        Ok(ScatteringCurve::new(q, intensity)?)
    }

    fn write_to(curve: &ScatteringCurve, writer: &mut impl Write) -> Result<(), CurveFileError> {
        for (q, intensity) in curve.points() {
            writeln!(writer, "{:.10e} {:.10e}", q, intensity)?;
        }
        Ok(())
    }
}
