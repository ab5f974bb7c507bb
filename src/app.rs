//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - loads pulsars and builds their signals
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DataArgs, ExportArgs, FitCmdArgs, NoiseArgs, NoiseCmdArgs, SimArgs, SummaryArgs};
use crate::data::{SimConfig, simulate_toas};
use crate::domain::{FourierSettings, NoiseSettings, PulsarInput, RunConfig};
use crate::error::AppError;
use crate::io::{write_combined_csv, write_model_json, write_summary_json, write_toas_csv};
use crate::report::{PulsarSummary, format_fit, format_noise, format_summary, summarize_pulsar};

pub mod pipeline;

/// Entry point for the `wb` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Summary(args) => handle_summary(args),
        Command::Noise(args) => handle_noise(args),
        Command::Fit(args) => handle_fit(args),
        Command::Export(args) => handle_export(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data, &args.noise)?;
    let summaries = summarize_all(&config, false)?;
    for s in &summaries {
        println!("{}", format_summary(s));
    }
    if let Some(path) = &args.export {
        write_summary_json(path, &summaries)?;
    }
    Ok(())
}

fn handle_noise(args: NoiseCmdArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data, &args.noise)?;
    for loaded in pipeline::load_pulsars(&config)? {
        let sc = pipeline::build_signals(&loaded.psr, &config)?;
        let values = pipeline::starting_values(&sc, config.fourier.seed)?;
        let eval = pipeline::evaluate_signals(&loaded.psr, &sc, &values)?;
        println!("{}", format_noise(loaded.psr.name(), &eval));
    }
    Ok(())
}

fn handle_fit(args: FitCmdArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data, &args.noise)?;
    let mut fits = Vec::new();
    for loaded in pipeline::load_pulsars(&config)? {
        let fit = pipeline::run_fit(&loaded.psr, &config.noise)?;
        println!("{}", format_fit(&fit));
        fits.push(fit);
    }
    if let Some(path) = &args.export {
        write_summary_json(path, &fits)?;
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data, &args.noise)?;
    let out_dir = &args.out_dir;
    create_dir(out_dir)?;

    let loaded = pipeline::load_pulsars(&config)?;
    for l in &loaded {
        let path = out_dir.join(format!("{}_combined.csv", l.psr.name()));
        write_combined_csv(&path, &l.psr)?;
        info!(path = %path.display(), "wrote combined CSV");
    }

    let summaries = summarize_loaded(&loaded, &config, true)?;
    let path = out_dir.join("summary.json");
    write_summary_json(&path, &summaries)?;
    println!("Wrote {} pulsar(s) to {}", loaded.len(), out_dir.display());
    Ok(())
}

fn handle_simulate(args: SimArgs) -> Result<(), AppError> {
    let sim = simulate_toas(&sim_config_from_args(&args))?;
    create_dir(&args.out_dir)?;

    let tim = args.out_dir.join(format!("{}.csv", args.name));
    let model = args.out_dir.join(format!("{}.json", args.name));
    write_toas_csv(&tim, &sim.toas)?;
    write_model_json(&model, &sim.model)?;

    println!("Wrote {} TOAs to {}", sim.toas.len(), tim.display());
    println!("Wrote model to {}", model.display());
    Ok(())
}

fn summarize_all(config: &RunConfig, with_fit: bool) -> Result<Vec<PulsarSummary>, AppError> {
    let loaded = pipeline::load_pulsars(config)?;
    summarize_loaded(&loaded, config, with_fit)
}

fn summarize_loaded(
    loaded: &[pipeline::LoadedPulsar],
    config: &RunConfig,
    with_fit: bool,
) -> Result<Vec<PulsarSummary>, AppError> {
    loaded
        .iter()
        .map(|l| {
            let sc = pipeline::build_signals(&l.psr, config)?;
            let values = pipeline::starting_values(&sc, config.fourier.seed)?;
            let mut summary = summarize_pulsar(l, &sc, &values)?;
            if with_fit {
                summary.fit = Some(pipeline::run_fit(&l.psr, &config.noise)?);
            }
            Ok(summary)
        })
        .collect()
}

fn create_dir(path: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(path)
        .map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", path.display())))
}

/// Build the pipeline configuration from CLI flags.
pub fn run_config_from_args(data: &DataArgs, noise: &NoiseArgs) -> Result<RunConfig, AppError> {
    if data.tims.len() != data.models.len() {
        return Err(AppError::usage(format!(
            "Got {} --tim file(s) but {} --model file(s); they are paired by position.",
            data.tims.len(),
            data.models.len()
        )));
    }
    if noise.nmodes == 0 {
        return Err(AppError::usage("--nmodes must be > 0."));
    }
    if let Some(t) = noise.tspan_days {
        if !(t.is_finite() && t > 0.0) {
            return Err(AppError::usage("--tspan-days must be > 0."));
        }
    }
    if !(noise.fref.is_finite() && noise.fref > 0.0) {
        return Err(AppError::usage("--fref must be > 0."));
    }

    let inputs = data
        .tims
        .iter()
        .zip(&data.models)
        .map(|(tim, model)| PulsarInput {
            tim: tim.clone(),
            model: model.clone(),
        })
        .collect();

    Ok(RunConfig {
        inputs,
        sort: !data.no_sort,
        noise: NoiseSettings {
            efac: noise.efac,
            log10_t2equad: noise.log10_t2equad,
            dmefac: noise.dmefac,
            log10_dmequad: noise.log10_dmequad,
            selection: noise.selection,
        },
        fourier: FourierSettings {
            nmodes: noise.nmodes,
            tspan: pipeline::tspan_seconds(noise.tspan_days),
            fref_mhz: noise.fref,
            log10_a: noise.log10_a,
            gamma: noise.gamma,
            seed: noise.seed,
        },
    })
}

pub fn sim_config_from_args(args: &SimArgs) -> SimConfig {
    SimConfig {
        name: args.name.clone(),
        ntoa: args.ntoa,
        seed: args.seed,
        start_mjd: args.start_mjd,
        span_days: args.span_days,
        freqs_mhz: args.freqs.clone(),
        backends: args.backends.clone(),
        toa_err_us: args.toa_err_us,
        dm_err: args.dm_err,
        inject_offset_us: args.inject_offset_us,
        inject_dm_offset: args.inject_dm_offset,
        ..SimConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Command {
        Cli::parse_from(argv).command
    }

    #[test]
    fn mismatched_tim_and_model_counts_are_rejected() {
        let Command::Noise(args) = parse(&["wb", "noise", "--tim", "a.csv", "--tim", "b.csv", "--model", "a.json"])
        else {
            panic!("expected noise");
        };
        let err = run_config_from_args(&args.data, &args.noise).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Usage);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_converts_tspan_to_seconds() {
        let Command::Fit(args) = parse(&[
            "wb",
            "fit",
            "--tim",
            "a.csv",
            "--model",
            "a.json",
            "--tspan-days",
            "2",
            "--no-sort",
        ]) else {
            panic!("expected fit");
        };
        let config = run_config_from_args(&args.data, &args.noise).unwrap();
        assert_eq!(config.inputs.len(), 1);
        assert!(!config.sort);
        assert_eq!(config.fourier.tspan, Some(172_800.0));
        assert_eq!(config.noise.efac, 1.0);
    }
}
