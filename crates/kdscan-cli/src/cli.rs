use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "kdscan - estimate dissociation constants from SAXS data by sweeping equilibrium models against an external fit engine.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep Kd against experimental data at every concentration and locate the optimal Kd.
    Sweep(SweepArgs),
    /// Run the L-curve analysis on previously exported chi-squared tables.
    Analyze(AnalyzeArgs),
    /// Tabulate species fractions over a concentration range at a fixed Kd.
    Profile(ProfileArgs),
}

/// Arguments for the `sweep` subcommand.
#[derive(Args, Debug)]
pub struct SweepArgs {
    // --- Core Arguments ---
    /// Path to the sweep configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory receiving artifacts and CSV exports.
    /// Overrides `output-dir` from the config file.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    // --- Model Overrides ---
    /// Override the binding model ('monomer-oligomer' or 'sequential-binding').
    #[arg(short, long, value_name = "KIND")]
    pub model: Option<String>,

    /// Override the stoichiometry n.
    #[arg(short = 'n', long, value_name = "INT")]
    pub stoichiometry: Option<u32>,

    /// Override the receptor concentration used by sequential binding.
    #[arg(long, value_name = "FLOAT")]
    pub receptor: Option<f64>,

    // --- Grid Overrides ---
    /// Override the lower end of the Kd range.
    #[arg(long, value_name = "FLOAT")]
    pub kd_min: Option<f64>,

    /// Override the upper end of the Kd range.
    #[arg(long, value_name = "FLOAT")]
    pub kd_max: Option<f64>,

    /// Override the number of log-spaced Kd values.
    #[arg(long, value_name = "INT")]
    pub kd_points: Option<usize>,

    // --- Fit Engine Overrides ---
    /// Override the fit engine executable.
    #[arg(long, value_name = "PATH")]
    pub fit_engine: Option<PathBuf>,

    /// Override the per-fit timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Override the maximum number of concurrent fits.
    #[arg(long, value_name = "INT")]
    pub max_workers: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sweep.kd-points=60
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Chi-squared CSV tables (columns `kd` and `chi2`). Rows with equal Kd
    /// across all tables are averaged.
    #[arg(short, long, required = true, num_args(1..), value_name = "PATH")]
    pub input: Vec<PathBuf>,

    /// Directory receiving the L-curve export.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output: PathBuf,
}

/// Arguments for the `profile` subcommand.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Binding model ('monomer-oligomer' or 'sequential-binding').
    #[arg(short, long, default_value = "monomer-oligomer", value_name = "KIND")]
    pub model: String,

    /// Stoichiometry n.
    #[arg(short = 'n', long, required = true, value_name = "INT")]
    pub stoichiometry: u32,

    /// Dissociation constant the profile is evaluated at.
    #[arg(short, long, required = true, value_name = "FLOAT")]
    pub kd: f64,

    /// Receptor concentration, required for sequential binding.
    #[arg(long, value_name = "FLOAT")]
    pub receptor: Option<f64>,

    /// Lower end of the concentration range.
    #[arg(long, value_name = "FLOAT")]
    pub conc_min: Option<f64>,

    /// Upper end of the concentration range.
    #[arg(long, value_name = "FLOAT")]
    pub conc_max: Option<f64>,

    /// Number of concentrations.
    #[arg(long, value_name = "INT")]
    pub points: Option<usize>,

    /// Space concentrations linearly instead of logarithmically.
    #[arg(long)]
    pub linear: bool,

    /// Path of the fraction CSV to write.
    #[arg(short, long, default_value = "fractions.csv", value_name = "PATH")]
    pub output: PathBuf,
}
