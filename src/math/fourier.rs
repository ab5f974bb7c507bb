//! Fourier design matrices for red-noise and DM-noise Gaussian processes.
//!
//! Columns come in sine/cosine pairs per frequency:
//!
//! ```text
//! F[i, 2k]   = sin(2π f_k t_i + φ_k)
//! F[i, 2k+1] = cos(2π f_k t_i + φ_k)
//! ```
//!
//! The default frequency grid is `f_k = k / T` for `k = 1..=nmodes`, where `T`
//! is the data span. The DM-noise basis scales every row by `(fref / ν_i)²` so
//! that a coefficient is a delay at the reference frequency.
//!
//! Wideband variants take the length-2N combined TOAs (timing block then DM
//! block) and adjust the DM block:
//! - red noise does not change the measured DM, so those rows are zero
//! - DM noise enters the DM block in pc cm⁻³, i.e. rows are multiplied by
//!   `ν² / DM_CONST`

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::domain::{DEFAULT_FREF_MHZ, DM_CONST};
use crate::error::AppError;

/// Frequency-grid options shared by all Fourier bases.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierOptions {
    pub nmodes: usize,
    /// Time span (s) defining the fundamental frequency; defaults to the data span.
    pub tspan: Option<f64>,
    /// Log-spaced grid between `fmin` and `fmax`.
    pub logf: bool,
    pub fmin: Option<f64>,
    pub fmax: Option<f64>,
    /// Random phase shift per mode.
    pub pshift: bool,
    /// Explicit frequencies (Hz); overrides `nmodes` and the grid options.
    pub modes: Option<Vec<f64>>,
    /// Seed for the phase shifts. Setting a seed implies `pshift`.
    pub pseed: Option<u64>,
}

impl Default for FourierOptions {
    fn default() -> Self {
        Self {
            nmodes: 30,
            tspan: None,
            logf: false,
            fmin: None,
            fmax: None,
            pshift: false,
            modes: None,
            pseed: None,
        }
    }
}

impl FourierOptions {
    pub fn with_nmodes(nmodes: usize) -> Self {
        Self {
            nmodes,
            ..Self::default()
        }
    }
}

/// A Fourier basis matrix and the frequency (Hz) of each column.
#[derive(Debug, Clone)]
pub struct FourierBasis {
    pub matrix: DMatrix<f64>,
    pub freqs: DVector<f64>,
}

/// Frequency grid (Hz, one entry per mode) for TOAs `toas` (s).
pub fn fourier_frequencies(toas: &[f64], opts: &FourierOptions) -> Result<Vec<f64>, AppError> {
    if let Some(modes) = &opts.modes {
        return Ok(modes.clone());
    }

    let span = match opts.tspan {
        Some(t) => t,
        None => {
            let (lo, hi) = toas
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
            hi - lo
        }
    };
    if !(span.is_finite() && span > 0.0) {
        return Err(AppError::numeric(format!(
            "Cannot build a Fourier basis over a time span of {span} s."
        )));
    }

    let n = opts.nmodes;
    if opts.fmin.is_none() && opts.fmax.is_none() && !opts.logf {
        return Ok((1..=n).map(|k| k as f64 / span).collect());
    }

    let fmin = opts.fmin.unwrap_or(1.0 / span);
    let fmax = opts.fmax.unwrap_or(n as f64 / span);
    if n == 1 {
        return Ok(vec![fmin]);
    }
    let f = if opts.logf {
        let (a, b) = (fmin.log10(), fmax.log10());
        (0..n)
            .map(|k| 10f64.powf(a + (b - a) * k as f64 / (n as f64 - 1.0)))
            .collect()
    } else {
        (0..n)
            .map(|k| fmin + (fmax - fmin) * k as f64 / (n as f64 - 1.0))
            .collect()
    };
    Ok(f)
}

/// Red-noise Fourier design matrix.
pub fn fourier_design_matrix_red(toas: &[f64], opts: &FourierOptions) -> Result<FourierBasis, AppError> {
    let f = fourier_frequencies(toas, opts)?;
    let nmodes = f.len();

    let phases: Vec<f64> = if opts.pshift || opts.pseed.is_some() {
        let mut rng = match opts.pseed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..nmodes).map(|_| rng.gen_range(0.0..2.0 * PI)).collect()
    } else {
        vec![0.0; nmodes]
    };

    let mut m = DMatrix::<f64>::zeros(toas.len(), 2 * nmodes);
    for (i, &t) in toas.iter().enumerate() {
        for k in 0..nmodes {
            let arg = 2.0 * PI * t * f[k] + phases[k];
            m[(i, 2 * k)] = arg.sin();
            m[(i, 2 * k + 1)] = arg.cos();
        }
    }

    let freqs = DVector::from_iterator(2 * nmodes, f.iter().flat_map(|&v| [v, v]));
    Ok(FourierBasis { matrix: m, freqs })
}

/// DM-noise Fourier design matrix: the red basis scaled by `(fref / ν)²`.
pub fn fourier_design_matrix_dm(
    toas: &[f64],
    radio_freqs: &[f64],
    fref: f64,
    opts: &FourierOptions,
) -> Result<FourierBasis, AppError> {
    if radio_freqs.len() != toas.len() {
        return Err(AppError::numeric(format!(
            "DM basis needs one radio frequency per TOA ({} vs {}).",
            radio_freqs.len(),
            toas.len()
        )));
    }
    let mut basis = fourier_design_matrix_red(toas, opts)?;
    for (i, mut row) in basis.matrix.row_iter_mut().enumerate() {
        let scale = (fref / radio_freqs[i]).powi(2);
        row *= scale;
    }
    Ok(basis)
}

/// Red-noise basis for combined wideband TOAs; DM-block rows are zero.
pub fn fourier_design_matrix_red_wideband(
    combined_toas: &[f64],
    opts: &FourierOptions,
) -> Result<FourierBasis, AppError> {
    let n = half_len(combined_toas.len())?;
    let mut basis = fourier_design_matrix_red(combined_toas, opts)?;
    let ncols = basis.matrix.ncols();
    basis.matrix.view_mut((n, 0), (n, ncols)).fill(0.0);
    Ok(basis)
}

/// DM-noise basis for combined wideband TOAs; DM-block rows are expressed in
/// DM units by multiplying with `ν² / DM_CONST`.
pub fn fourier_design_matrix_dm_wideband(
    combined_toas: &[f64],
    combined_freqs: &[f64],
    fref: Option<f64>,
    opts: &FourierOptions,
) -> Result<FourierBasis, AppError> {
    let n = half_len(combined_toas.len())?;
    let fref = fref.unwrap_or(DEFAULT_FREF_MHZ);
    let mut basis = fourier_design_matrix_dm(combined_toas, combined_freqs, fref, opts)?;
    for i in n..2 * n {
        let scale = combined_freqs[i] * combined_freqs[i] / DM_CONST;
        let mut row = basis.matrix.row_mut(i);
        row *= scale;
    }
    Ok(basis)
}

fn half_len(len: usize) -> Result<usize, AppError> {
    if len % 2 != 0 {
        return Err(AppError::numeric(format!(
            "Combined wideband arrays must have even length (got {len})."
        )));
    }
    Ok(len / 2)
}
