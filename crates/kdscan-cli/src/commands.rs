pub mod analyze;
pub mod profile;
pub mod sweep;

use crate::error::{CliError, Result};
use kdscan::core::analysis::LCurveResult;
use kdscan::core::io::table::{self, TableError};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Creates `path` and hands a buffered writer to a CSV exporter.
pub(crate) fn export_csv<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> std::result::Result<(), TableError>,
{
    let file = File::create(path)?;
    write(BufWriter::new(file)).map_err(|e| CliError::Export {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    info!(path = %path.display(), "Exported table.");
    Ok(())
}

pub(crate) fn export_lcurve(path: &Path, result: &LCurveResult) -> Result<()> {
    export_csv(path, |w| {
        table::write_lcurve(&result.log_kd, &result.log_chi2, &result.curvature, w)
    })
}

pub(crate) fn print_analysis(result: &LCurveResult) {
    match result.kd_error {
        Some(error) => println!("Optimal Kd: {:.4} ± {:.4}", result.optimal_kd, error),
        None => println!("Optimal Kd: {:.4} (uncertainty unavailable)", result.optimal_kd),
    }
    println!(
        "  Uncertainty bracket: {:.4} .. {:.4}",
        result.bracket.0, result.bracket.1
    );
    if !result.change_point_kds.is_empty() {
        let points: Vec<String> = result
            .change_point_kds
            .iter()
            .map(|kd| format!("{:.4}", kd))
            .collect();
        println!("  Change points: {}", points.join(", "));
    }
    println!("  Usable points: {}", result.valid_points);
    if !result.is_confident() {
        println!("  Warning: low-confidence estimate.");
        for reason in &result.reasons {
            println!("    - {}", reason);
        }
    }
}
