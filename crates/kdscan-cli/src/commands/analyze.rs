use super::{export_csv, export_lcurve, print_analysis};
use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use kdscan::core::io::table::{self, TableRow};
use kdscan::core::models::chi2::AveragedCurve;
use kdscan::engine::cache::LCurveCache;
use kdscan::engine::error::EngineError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let tables = args
        .input
        .iter()
        .map(|path| read_table(path).map(|rows| (path.clone(), rows)))
        .collect::<Result<Vec<_>>>()?;

    let mut cache = LCurveCache::default();

    if tables.len() > 1 {
        for (path, rows) in &tables {
            let single = scored_curve(rows);
            match cache.get_or_compute(&single, None) {
                Ok(result) => println!(
                    "{}: optimal Kd {:.4} ({} usable points)",
                    path.display(),
                    result.optimal_kd,
                    result.valid_points
                ),
                Err(error) => warn!(path = %path.display(), %error, "Table cannot be analysed on its own."),
            }
        }
        println!();
    }

    let averaged = AveragedCurve::from_points(
        tables
            .iter()
            .flat_map(|(_, rows)| scored_points(rows)),
    );
    info!(
        tables = tables.len(),
        points = averaged.len(),
        "Running L-curve analysis on the averaged curve."
    );
    let result = cache
        .get_or_compute(&averaged, None)
        .map_err(EngineError::from)?
        .clone();

    std::fs::create_dir_all(&args.output)?;
    export_csv(&args.output.join("chi2_average.csv"), |w| {
        table::write_averaged_table(&averaged, w)
    })?;
    export_lcurve(&args.output.join("lcurve.csv"), &result)?;

    print_analysis(&result);
    println!("Results written to: {}", args.output.display());
    Ok(())
}

fn read_table(path: &Path) -> Result<Vec<TableRow>> {
    info!(path = %path.display(), "Reading chi-squared table.");
    let file = File::open(path)?;
    table::read_chi_squared_table(BufReader::new(file)).map_err(|e| CliError::FileParsing {
        path: PathBuf::from(path),
        source: e.into(),
    })
}

fn scored_points(rows: &[TableRow]) -> impl Iterator<Item = (f64, f64)> + '_ {
    rows.iter().filter_map(|row| row.chi2.map(|chi2| (row.kd, chi2)))
}

fn scored_curve(rows: &[TableRow]) -> AveragedCurve {
    AveragedCurve::from_points(scored_points(rows))
}
