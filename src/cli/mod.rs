//! Command-line parsing for the wideband timing tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! dataset/signal code. `app` turns these structs into a `RunConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::SelectionKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wb", version, about = "Wideband pulsar timing: combined TOA + DM datasets and noise signals")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` applies otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load pulsars and print dataset and signal summaries.
    Summary(SummaryArgs),
    /// Evaluate the wideband noise signals at fixed or sampled parameter values.
    Noise(NoiseCmdArgs),
    /// Weighted least-squares fit of the combined residuals.
    Fit(FitCmdArgs),
    /// Write combined residuals, design matrices and a JSON summary to a directory.
    Export(ExportArgs),
    /// Generate a synthetic wideband TOA CSV plus matching model JSON.
    Simulate(SimArgs),
}

/// Input pulsars: `--tim`/`--model` pairs matched by position.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// TOA CSV file (repeatable).
    #[arg(long = "tim", value_name = "CSV", required = true)]
    pub tims: Vec<PathBuf>,

    /// Timing model JSON file (repeatable, one per `--tim`).
    #[arg(long = "model", value_name = "JSON", required = true)]
    pub models: Vec<PathBuf>,

    /// Keep TOAs in input order instead of sorting by epoch.
    #[arg(long)]
    pub no_sort: bool,
}

/// White-noise and Fourier-basis settings.
#[derive(Debug, Args, Clone)]
pub struct NoiseArgs {
    /// TOA uncertainty scale factor.
    #[arg(long, default_value_t = 1.0)]
    pub efac: f64,

    /// log10 of the TOA EQUAD (s).
    #[arg(long, default_value_t = -8.0, allow_hyphen_values = true)]
    pub log10_t2equad: f64,

    /// DM uncertainty scale factor.
    #[arg(long, default_value_t = 1.0)]
    pub dmefac: f64,

    /// log10 of the DM EQUAD (pc cm^-3).
    #[arg(long, default_value_t = -8.0, allow_hyphen_values = true)]
    pub log10_dmequad: f64,

    /// Split white-noise parameters by data subset.
    #[arg(long, value_enum, default_value_t = SelectionKind::None)]
    pub selection: SelectionKind,

    /// Fourier modes for the red-noise and DM-noise bases.
    #[arg(long, default_value_t = 30)]
    pub nmodes: usize,

    /// Fourier basis span (days); defaults to the data span.
    #[arg(long)]
    pub tspan_days: Option<f64>,

    /// Reference frequency (MHz) for the DM-noise basis.
    #[arg(long, default_value_t = 1400.0)]
    pub fref: f64,

    /// Fix the GP power-law amplitude (log10) instead of sampling it.
    #[arg(long, allow_hyphen_values = true)]
    pub log10_a: Option<f64>,

    /// Fix the GP power-law index instead of sampling it.
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Seed for sampling free parameters from their priors.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub noise: NoiseArgs,

    /// Write the summary as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct NoiseCmdArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub noise: NoiseArgs,
}

#[derive(Debug, Args, Clone)]
pub struct FitCmdArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub noise: NoiseArgs,

    /// Write fit results as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub noise: NoiseArgs,

    /// Output directory (created if missing).
    #[arg(long, default_value = "wb-out")]
    pub out_dir: PathBuf,
}

/// Options for synthetic data generation.
#[derive(Debug, Args, Clone)]
pub struct SimArgs {
    /// Pulsar name (also the output file stem).
    #[arg(long, default_value = "J1909-3744")]
    pub name: String,

    /// Number of TOAs.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub ntoa: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 55000.0)]
    pub start_mjd: f64,

    #[arg(long, default_value_t = 1500.0)]
    pub span_days: f64,

    /// Observing frequencies (MHz), comma separated.
    #[arg(long, value_delimiter = ',', default_value = "820,1400")]
    pub freqs: Vec<f64>,

    /// Backend flags, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "GUPPI")]
    pub backends: Vec<String>,

    /// Typical TOA uncertainty (us).
    #[arg(long, default_value_t = 0.5)]
    pub toa_err_us: f64,

    /// Typical DM uncertainty (pc cm^-3).
    #[arg(long, default_value_t = 2e-4)]
    pub dm_err: f64,

    /// Constant offset added to every residual (us).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub inject_offset_us: f64,

    /// DM offset relative to the written model (pc cm^-3).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub inject_dm_offset: f64,

    /// Output directory for `<name>.csv` and `<name>.json`.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}
