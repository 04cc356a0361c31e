use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurveFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CurveParseErrorKind,
    },
    #[error("File contains no data rows")]
    NoData,
    #[error("Uncertainty on data row {row} must be positive (got {value})")]
    NonPositiveSigma { row: usize, value: f64 },
    #[error("Invalid curve: {0}")]
    Curve(#[from] crate::core::models::curve::CurveError),
}

#[derive(Debug, Error, PartialEq)]
pub enum CurveParseErrorKind {
    #[error("Expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("Invalid float in column {column} (value: '{value}')")]
    InvalidFloat { column: usize, value: String },
}

/// Defines the interface for reading and writing whitespace-separated curve files.
///
/// Implementors fix the column layout of one file kind and the in-memory type
/// it maps to.
pub trait CurveFile {
    /// The in-memory representation of one file.
    type Data;

    /// Reads a curve from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a data row is malformed or no data rows exist.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Data, CurveFileError>;

    /// Writes a curve to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), CurveFileError>;

    /// Reads a curve from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Data, CurveFileError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a curve to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(data: &Self::Data, path: P) -> Result<(), CurveFileError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(data, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Renders a curve to text, for writers that do not own a file handle.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    fn to_text(data: &Self::Data) -> Result<String, CurveFileError> {
        let mut buffer = Vec::new();
        Self::write_to(data, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }
}

/// Reads numeric rows, keeping the first `columns` values of each.
///
/// Lines that are empty, start with `#`, or whose first token is not a number
/// are treated as headers or footers and skipped. A line that starts with a
/// number must carry `columns` parseable values.
pub(crate) fn read_numeric_rows(
    reader: &mut impl BufRead,
    columns: usize,
) -> Result<Vec<Vec<f64>>, CurveFileError> {
    let mut rows = Vec::new();
    let mut line = String::new();
    let mut line_number = 0;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_number += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens[0].parse::<f64>().is_err() {
            continue;
        }
        if tokens.len() < columns {
            return Err(CurveFileError::Parse {
                line: line_number,
                kind: CurveParseErrorKind::TooFewColumns {
                    expected: columns,
                    found: tokens.len(),
                },
            });
        }

        let row = tokens[..columns]
            .iter()
            .enumerate()
            .map(|(column, token)| {
                token.parse::<f64>().map_err(|_| CurveFileError::Parse {
                    line: line_number,
                    kind: CurveParseErrorKind::InvalidFloat {
                        column: column + 1,
                        value: token.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(CurveFileError::NoData);
    }
    Ok(rows)
}

/// Splits row-major data into its columns.
pub(crate) fn into_columns(rows: Vec<Vec<f64>>, columns: usize) -> Vec<Vec<f64>> {
    let mut out = vec![Vec::with_capacity(rows.len()); columns];
    for row in rows {
        for (column, value) in out.iter_mut().zip(row) {
            column.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_and_comment_lines_are_skipped() {
        let text = "Sample description\n# comment\n\n0.01 100.0 1.0\n0.02 90.0 1.0\n";
        let rows = read_numeric_rows(&mut Cursor::new(text), 2).unwrap();
        assert_eq!(rows, vec![vec![0.01, 100.0], vec![0.02, 90.0]]);
    }

    #[test]
    fn short_data_row_reports_line_number() {
        let text = "0.01 100.0 1.0\n0.02 90.0\n";
        let err = read_numeric_rows(&mut Cursor::new(text), 3).unwrap_err();
        match err {
            CurveFileError::Parse { line, kind } => {
                assert_eq!(line, 2);
                assert_eq!(
                    kind,
                    CurveParseErrorKind::TooFewColumns {
                        expected: 3,
                        found: 2
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_value_reports_column() {
        let text = "0.01 abc\n";
        let err = read_numeric_rows(&mut Cursor::new(text), 2).unwrap_err();
        assert!(matches!(
            err,
            CurveFileError::Parse {
                line: 1,
                kind: CurveParseErrorKind::InvalidFloat { column: 2, .. }
            }
        ));
    }

    #[test]
    fn file_without_data_is_rejected() {
        let err = read_numeric_rows(&mut Cursor::new("header only\n"), 2).unwrap_err();
        assert!(matches!(err, CurveFileError::NoData));
    }

    #[test]
    fn into_columns_transposes_rows() {
        let cols = into_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 2);
        assert_eq!(cols, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
