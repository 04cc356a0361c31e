//! CSV exports of sweep tables, profiles and analysis curves.

use super::fit::FitCurve;
use crate::core::equilibrium::profile::FractionProfile;
use crate::core::models::chi2::{AveragedCurve, ChiSquaredCurve};
use serde::Deserialize;
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Table has no usable rows")]
    Empty,
}

/// One row of a previously exported chi-squared table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableRow {
    pub kd: f64,
    #[serde(default)]
    pub concentration: Option<f64>,
    #[serde(default)]
    pub chi2: Option<f64>,
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_chi_squared_table(
    curve: &ChiSquaredCurve,
    writer: impl Write,
) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["kd".to_string(), "concentration".to_string()];
    header.extend(curve.species_labels.iter().map(|l| format!("{}_frac", l)));
    header.push("chi2".to_string());
    csv.write_record(&header)?;

    for record in &curve.records {
        let mut row = vec![record.kd.to_string(), record.concentration.to_string()];
        row.extend(record.fractions.iter().map(f64::to_string));
        row.push(optional(record.chi_squared));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_averaged_table(curve: &AveragedCurve, writer: impl Write) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["kd", "chi2", "samples"])?;
    for point in &curve.points {
        csv.write_record([
            point.kd.to_string(),
            point.chi_squared.to_string(),
            point.samples.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_fraction_profile(
    profile: &FractionProfile,
    writer: impl Write,
) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["concentration".to_string()];
    header.extend(profile.species_labels.iter().map(|l| format!("{}_frac", l)));
    csv.write_record(&header)?;

    for row in &profile.rows {
        let mut record = vec![row.concentration.to_string()];
        match &row.fractions {
            Some(fractions) => record.extend(fractions.iter().map(f64::to_string)),
            None => record.extend(std::iter::repeat_n(String::new(), profile.species_labels.len())),
        }
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the resampled L-curve in linear Kd with its smoothed curvature.
pub fn write_lcurve(
    log_kd: &[f64],
    log_chi2: &[f64],
    curvature: &[f64],
    writer: impl Write,
) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["kd", "chi2", "curvature"])?;
    for ((x, y), k) in log_kd.iter().zip(log_chi2).zip(curvature) {
        csv.write_record([
            10f64.powf(*x).to_string(),
            10f64.powf(*y).to_string(),
            k.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_fit_comparison(fit: &FitCurve, writer: impl Write) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["q", "i_exp", "sigma", "i_fit", "residual"])?;
    for (i, residual) in fit.residuals().into_iter().enumerate() {
        csv.write_record([
            fit.q[i].to_string(),
            fit.experimental[i].to_string(),
            fit.sigma[i].to_string(),
            fit.fitted[i].to_string(),
            residual.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads a chi-squared table; extra columns such as fractions are ignored.
pub fn read_chi_squared_table(reader: impl Read) -> Result<Vec<TableRow>, TableError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows = csv
        .deserialize::<TableRow>()
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(TableError::Empty);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::equilibrium::profile::ProfileRow;
    use crate::core::models::chi2::ChiSquaredRecord;

    fn sample_curve() -> ChiSquaredCurve {
        let mut curve = ChiSquaredCurve::new(36.0, vec!["monomer".into(), "oligomer".into()], 2);
        curve.records = vec![
            ChiSquaredRecord {
                kd: 1.5,
                concentration: 36.0,
                fractions: vec![0.25, 0.75],
                chi_squared: Some(2.5),
            },
            ChiSquaredRecord {
                kd: 3.0,
                concentration: 36.0,
                fractions: vec![0.5, 0.5],
                chi_squared: None,
            },
        ];
        curve
    }

    #[test]
    fn chi_squared_table_has_species_columns_and_blank_missing_values() {
        let mut buffer = Vec::new();
        write_chi_squared_table(&sample_curve(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "kd,concentration,monomer_frac,oligomer_frac,chi2");
        assert_eq!(lines[1], "1.5,36,0.25,0.75,2.5");
        assert_eq!(lines[2], "3,36,0.5,0.5,");
    }

    #[test]
    fn exported_table_reads_back_with_missing_chi_squared() {
        let mut buffer = Vec::new();
        write_chi_squared_table(&sample_curve(), &mut buffer).unwrap();
        let rows = read_chi_squared_table(buffer.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chi2, Some(2.5));
        assert_eq!(rows[0].concentration, Some(36.0));
        assert_eq!(rows[1].chi2, None);
    }

    #[test]
    fn minimal_two_column_table_is_accepted() {
        let rows = read_chi_squared_table("kd,chi2\n1,10\n2,5\n".as_bytes()).unwrap();
        assert_eq!(rows[1].kd, 2.0);
        assert_eq!(rows[1].concentration, None);
    }

    #[test]
    fn empty_table_is_rejected() {
        let result = read_chi_squared_table("kd,chi2\n".as_bytes());
        assert!(matches!(result, Err(TableError::Empty)));
    }

    #[test]
    fn profile_rows_without_solution_are_left_blank() {
        let profile = FractionProfile {
            kd: 1.0,
            species_labels: vec!["monomer".into(), "oligomer".into()],
            rows: vec![
                ProfileRow {
                    concentration: 0.0,
                    fractions: None,
                },
                ProfileRow {
                    concentration: 1.0,
                    fractions: Some(vec![0.5, 0.5]),
                },
            ],
        };
        let mut buffer = Vec::new();
        write_fraction_profile(&profile, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "concentration,monomer_frac,oligomer_frac\n0,,\n1,0.5,0.5\n"
        );
    }

    #[test]
    fn averaged_table_lists_samples() {
        let avg = AveragedCurve::from_points(vec![(1.0, 2.0), (1.0, 4.0)]);
        let mut buffer = Vec::new();
        write_averaged_table(&avg, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "kd,chi2,samples\n1,3,2\n");
    }
}
