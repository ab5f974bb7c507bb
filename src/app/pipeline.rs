//! Shared pipeline logic used by all CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV + model JSON -> `WidebandPulsar` -> signals -> evaluation / fit.
//!
//! The command handlers in `app` then only deal with presentation.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{DAY_SECONDS, FourierSettings, NoiseSettings, PulsarInput, RunConfig};
use crate::error::AppError;
use crate::fit::{WidebandFit, fit_wideband};
use crate::io::{load_toas, read_model_json};
use crate::math::FourierOptions;
use crate::models::LinearTimingModel;
use crate::pulsar::{PulsarOptions, WidebandPulsar};
use crate::signals::{
    FourierBasisGp, FourierKind, ParamValues, Parameter, Signal, SignalCollection, WidebandMeasurementNoise,
    WidebandTimingModel, sample_params,
};

/// One pulsar loaded from disk.
#[derive(Debug, Clone)]
pub struct LoadedPulsar {
    pub psr: WidebandPulsar,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub mjd_start: f64,
    pub mjd_end: f64,
}

/// Signals of one pulsar evaluated at a single parameter point.
#[derive(Debug, Clone)]
pub struct SignalEvaluation {
    /// Free parameter values, sorted by name.
    pub values: Vec<(String, f64)>,
    pub ndiag: DVector<f64>,
    pub basis: DMatrix<f64>,
    pub phiinv: DVector<f64>,
}

/// Load one TOA CSV + model JSON pair and build its wideband dataset.
pub fn load_pulsar(input: &PulsarInput, sort: bool) -> Result<LoadedPulsar, AppError> {
    let model_file = read_model_json(&input.model)?;
    let ingested = load_toas(&input.tim, model_file.psr.as_deref())?;
    let model = LinearTimingModel::from_file(&model_file)?;
    let psr = WidebandPulsar::new(&ingested.toas, &model, PulsarOptions { sort })?;

    let mjds = ingested.toas.mjds();
    let mjd_start = mjds.iter().copied().fold(f64::INFINITY, f64::min);
    let mjd_end = mjds.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(LoadedPulsar {
        psr,
        rows_read: ingested.rows_read,
        rows_skipped: ingested.row_errors.len(),
        mjd_start,
        mjd_end,
    })
}

/// Load all configured pulsars in parallel, keeping input order.
pub fn load_pulsars(config: &RunConfig) -> Result<Vec<LoadedPulsar>, AppError> {
    if config.inputs.is_empty() {
        return Err(AppError::usage("No pulsars given (use --tim/--model)."));
    }
    let loaded: Vec<LoadedPulsar> = config
        .inputs
        .par_iter()
        .map(|input| load_pulsar(input, config.sort))
        .collect::<Result<_, _>>()?;
    info!(npsr = loaded.len(), "loaded pulsars");
    Ok(loaded)
}

/// Measurement-noise factory with every parameter fixed to the configured value.
pub fn measurement_noise(settings: &NoiseSettings) -> WidebandMeasurementNoise {
    WidebandMeasurementNoise {
        efac: Parameter::constant(settings.efac),
        log10_t2equad: Parameter::constant(settings.log10_t2equad),
        dmefac: Parameter::constant(settings.dmefac),
        log10_dmequad: Parameter::constant(settings.log10_dmequad),
        selection: settings.selection.into(),
        name: String::new(),
    }
}

fn fourier_options(settings: &FourierSettings) -> FourierOptions {
    FourierOptions {
        tspan: settings.tspan,
        ..FourierOptions::with_nmodes(settings.nmodes)
    }
}

fn power_law_gp(mut gp: FourierBasisGp, settings: &FourierSettings) -> FourierBasisGp {
    if let Some(v) = settings.log10_a {
        gp.log10_a = Parameter::constant(v);
    }
    if let Some(v) = settings.gamma {
        gp.gamma = Parameter::constant(v);
    }
    gp
}

/// Build the full wideband signal set of one pulsar: timing model, measurement
/// noise, red noise and DM noise.
pub fn build_signals(psr: &WidebandPulsar, config: &RunConfig) -> Result<SignalCollection, AppError> {
    let fourier = fourier_options(&config.fourier);

    let red = power_law_gp(FourierBasisGp::red_noise(fourier.clone()), &config.fourier);
    let dm = power_law_gp(
        FourierBasisGp {
            kind: FourierKind::DmNoise {
                fref_mhz: config.fourier.fref_mhz,
            },
            ..FourierBasisGp::dm_noise(fourier)
        },
        &config.fourier,
    );

    let mut sc = SignalCollection::new();
    sc.push(WidebandTimingModel::default().build(psr)?);
    sc.push(measurement_noise(&config.noise).build(psr));
    sc.push(red.build(psr)?);
    sc.push(dm.build(psr)?);

    debug!(psr = psr.name(), nsignals = sc.signals().len(), nparams = sc.params().len(), "built signals");
    Ok(sc)
}

/// Draw free parameter values from their priors with the configured seed.
pub fn starting_values(sc: &SignalCollection, seed: u64) -> Result<ParamValues, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    sample_params(&sc.params(), &mut rng)
}

/// Evaluate noise diagonal, basis and inverse prior at `values`.
pub fn evaluate_signals(
    psr: &WidebandPulsar,
    sc: &SignalCollection,
    values: &ParamValues,
) -> Result<SignalEvaluation, AppError> {
    let ndiag = sc
        .get_ndiag(values)?
        .ok_or_else(|| AppError::numeric("No white-noise signal in the collection."))?;
    let basis = sc
        .get_basis(values)?
        .ok_or_else(|| AppError::numeric("No basis signal in the collection."))?;
    let phiinv = sc
        .get_phiinv(values)?
        .ok_or_else(|| AppError::numeric("No basis prior in the collection."))?;

    let nrows = psr.combined_toas().len();
    if ndiag.len() != nrows || basis.nrows() != nrows || basis.ncols() != phiinv.len() {
        return Err(AppError::numeric(format!(
            "Inconsistent signal shapes for {}: ndiag={}, basis={}x{}, phiinv={}.",
            psr.name(),
            ndiag.len(),
            basis.nrows(),
            basis.ncols(),
            phiinv.len()
        )));
    }

    let mut sorted: Vec<(String, f64)> = values.iter().map(|(k, v)| (k.clone(), *v)).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(SignalEvaluation {
        values: sorted,
        ndiag,
        basis,
        phiinv,
    })
}

/// Fit one pulsar with the fixed white-noise settings.
pub fn run_fit(psr: &WidebandPulsar, settings: &NoiseSettings) -> Result<WidebandFit, AppError> {
    let ndiag = measurement_noise(settings)
        .build(psr)
        .get_ndiag(&ParamValues::new())?
        .ok_or_else(|| AppError::numeric("Measurement noise produced no diagonal."))?;
    fit_wideband(psr, &ndiag)
}

/// Convert a Fourier span in days to seconds.
pub fn tspan_seconds(days: Option<f64>) -> Option<f64> {
    days.map(|d| d * DAY_SECONDS)
}
